//! Environment probe: reports on the calling environment (compiled-in
//! library versions, env var presence, endpoint reachability).
//!
//! This is a diagnostic utility with no bearing on screen results; it
//! deliberately reads ambient process state, which the screen path itself
//! never does.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const REACHABILITY_TIMEOUT: Duration = Duration::from_secs(3);

/// A library the probe should report on. Versions are captured at compile
/// time by whoever builds the spec; absent version means "not compiled in".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryProbe {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSpec {
    pub libraries: Vec<LibraryProbe>,
    pub variables: Vec<String>,
    pub endpoints: Vec<String>,
}

/// The probe report: library name to version-or-absent, variable name to
/// present, endpoint to reachable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeReport {
    pub libraries: BTreeMap<String, Option<String>>,
    pub variables: BTreeMap<String, bool>,
    pub endpoints: BTreeMap<String, bool>,
}

/// Spec covering this crate itself plus the variables and endpoints the
/// screener examples historically depended on.
pub fn default_spec() -> ProbeSpec {
    ProbeSpec {
        libraries: vec![LibraryProbe {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }],
        variables: vec!["SCREENER_API_KEY".to_string()],
        endpoints: vec!["https://api.polygon.io".to_string()],
    }
}

/// Run every check in the spec. Probing never fails: an unreachable
/// endpoint or missing variable is a `false` in the report, not an error.
pub async fn run_probe(spec: &ProbeSpec, client: &reqwest::Client) -> ProbeReport {
    let mut report = ProbeReport::default();

    for lib in &spec.libraries {
        report.libraries.insert(lib.name.clone(), lib.version.clone());
    }

    for var in &spec.variables {
        report.variables.insert(var.clone(), std::env::var(var).is_ok());
    }

    for url in &spec.endpoints {
        let reachable = match client
            .head(url)
            .timeout(REACHABILITY_TIMEOUT)
            .send()
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("Endpoint {} unreachable: {}", url, e);
                false
            }
        };
        report.endpoints.insert(url.clone(), reachable);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_library_versions_and_variables() {
        std::env::set_var("ENV_PROBE_TEST_PRESENT", "1");
        std::env::remove_var("ENV_PROBE_TEST_ABSENT");

        let spec = ProbeSpec {
            libraries: vec![
                LibraryProbe {
                    name: "env-probe".into(),
                    version: Some("0.1.0".into()),
                },
                LibraryProbe {
                    name: "pandas_ta".into(),
                    version: None,
                },
            ],
            variables: vec![
                "ENV_PROBE_TEST_PRESENT".into(),
                "ENV_PROBE_TEST_ABSENT".into(),
            ],
            endpoints: vec![],
        };

        let report = run_probe(&spec, &reqwest::Client::new()).await;
        assert_eq!(report.libraries["env-probe"], Some("0.1.0".to_string()));
        assert_eq!(report.libraries["pandas_ta"], None);
        assert_eq!(report.variables["ENV_PROBE_TEST_PRESENT"], true);
        assert_eq!(report.variables["ENV_PROBE_TEST_ABSENT"], false);
        assert!(report.endpoints.is_empty());
    }

    #[tokio::test]
    async fn report_serializes_as_plain_json() {
        let spec = ProbeSpec {
            libraries: vec![LibraryProbe {
                name: "yfinance".into(),
                version: None,
            }],
            variables: vec!["HOME".into()],
            endpoints: vec![],
        };
        let report = run_probe(&spec, &reqwest::Client::new()).await;
        let value = serde_json::to_value(&report).unwrap();
        assert!(value["libraries"]["yfinance"].is_null());
        assert!(value["variables"]["HOME"].is_boolean());
    }

    #[test]
    fn default_spec_names_this_crate() {
        let spec = default_spec();
        assert_eq!(spec.libraries[0].name, "env-probe");
        assert!(spec.libraries[0].version.is_some());
    }
}
