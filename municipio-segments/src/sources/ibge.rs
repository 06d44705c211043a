//! Service de localités de l'IBGE
//!
//! `GET {base}/api/v1/localidades/municipios/{code}` retourne un objet, ou une
//! liste pour certains codes à 6 chiffres.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use osmnet::{AdministrativeCode, AreaIdentity, PipelineError};

use super::{describe_http_error, AreaLookup};
use crate::config::Settings;

/// Chemins possibles du sigle de l'UF, par ordre de préférence
const UF_PATHS: [&[&str]; 2] = [
    &["microrregiao", "mesorregiao", "UF", "sigla"],
    &["regiao-imediata", "regiao-intermediaria", "UF", "sigla"],
];

/// Lookup HTTP auprès de l'IBGE
#[derive(Debug, Clone)]
pub struct IbgeLookup {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl IbgeLookup {
    pub fn new(client: Client, settings: &Settings) -> Self {
        Self {
            client,
            base_url: settings.ibge_url.clone(),
            timeout_secs: settings.timeout_secs,
        }
    }

    /// URL de la fiche d'une municipalité
    pub fn municipio_url(&self, code: &AdministrativeCode) -> String {
        format!(
            "{}/api/v1/localidades/municipios/{}",
            self.base_url.trim_end_matches('/'),
            code
        )
    }
}

#[async_trait]
impl AreaLookup for IbgeLookup {
    async fn lookup(&self, code: &AdministrativeCode) -> Result<AreaIdentity, PipelineError> {
        let url = self.municipio_url(code);
        debug!(url = %url, "Querying IBGE");

        let failed = |reason: String| PipelineError::lookup_failed(code.as_str(), reason);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| failed(describe_http_error(&e, self.timeout_secs)))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| failed(format!("invalid JSON response: {}", e)))?;

        parse_municipio(code, &body)
    }
}

/// Extrait nom et UF d'une réponse IBGE
pub fn parse_municipio(code: &AdministrativeCode, body: &Value) -> Result<AreaIdentity, PipelineError> {
    let failed = |reason: &str| PipelineError::lookup_failed(code.as_str(), reason);

    let record = match body {
        Value::Array(items) => items.first().ok_or_else(|| failed("empty response"))?,
        Value::Object(_) => body,
        _ => return Err(failed("unexpected response shape")),
    };

    let name = record
        .get("nome")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| failed("missing field 'nome'"))?;

    let uf = UF_PATHS
        .iter()
        .find_map(|path| lookup_path(record, path))
        .ok_or_else(|| failed("missing UF abbreviation"))?;

    Ok(AreaIdentity {
        code: code.clone(),
        name: name.to_string(),
        uf: uf.to_string(),
    })
}

fn lookup_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(value, |v, key| v.get(*key))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use osmnet::ErrorKind;
    use serde_json::json;

    fn code() -> AdministrativeCode {
        AdministrativeCode::parse("4314902").unwrap()
    }

    fn porto_alegre() -> Value {
        json!({
            "id": 4314902,
            "nome": "Porto Alegre",
            "microrregiao": {
                "id": 43026,
                "nome": "Porto Alegre",
                "mesorregiao": {
                    "id": 4305,
                    "nome": "Metropolitana de Porto Alegre",
                    "UF": { "id": 43, "sigla": "RS", "nome": "Rio Grande do Sul" }
                }
            },
            "regiao-imediata": {
                "id": 430001,
                "regiao-intermediaria": {
                    "id": 4301,
                    "UF": { "id": 43, "sigla": "RS", "nome": "Rio Grande do Sul" }
                }
            }
        })
    }

    #[test]
    fn test_parse_object() {
        let identity = parse_municipio(&code(), &porto_alegre()).unwrap();
        assert_eq!(identity.name, "Porto Alegre");
        assert_eq!(identity.uf, "RS");
        assert_eq!(identity.code, code());
    }

    #[test]
    fn test_parse_list_takes_first() {
        let body = json!([porto_alegre(), { "nome": "Other", "microrregiao": null }]);
        let identity = parse_municipio(&code(), &body).unwrap();
        assert_eq!(identity.name, "Porto Alegre");
    }

    #[test]
    fn test_uf_fallback_without_microrregiao() {
        let mut body = porto_alegre();
        body["microrregiao"] = Value::Null;

        let identity = parse_municipio(&code(), &body).unwrap();
        assert_eq!(identity.uf, "RS");
    }

    #[test]
    fn test_missing_fields() {
        let err = parse_municipio(&code(), &json!([])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AreaLookupFailed);

        let err = parse_municipio(&code(), &json!({ "nome": "Porto Alegre" })).unwrap_err();
        assert!(err.to_string().contains("UF"));

        let mut body = porto_alegre();
        body.as_object_mut().unwrap().remove("nome");
        assert!(parse_municipio(&code(), &body).is_err());

        assert!(parse_municipio(&code(), &json!("oops")).is_err());
    }

    #[test]
    fn test_municipio_url() {
        let settings = Settings {
            ibge_url: "http://ibge.test/".to_string(),
            ..Settings::default()
        };
        let lookup = IbgeLookup::new(Client::new(), &settings);
        assert_eq!(
            lookup.municipio_url(&code()),
            "http://ibge.test/api/v1/localidades/municipios/4314902"
        );
    }
}
