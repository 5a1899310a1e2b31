use serde::{Deserialize, Serialize};

use crate::ExperimentModel;

/// Configuration payload as delivered by the configuration source.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Configuration {
    #[serde(default)]
    experiments: Vec<TryParse<ExperimentModel>>,
}

/// `TryParse` allows the subfield to fail parsing without failing the parsing of the whole
/// structure.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum TryParse<T> {
    Parsed(T),
    ParseFailed(serde_json::Value),
}

impl<T> From<TryParse<T>> for Option<T> {
    fn from(value: TryParse<T>) -> Self {
        match value {
            TryParse::Parsed(v) => Some(v),
            TryParse::ParseFailed(_) => None,
        }
    }
}

impl Configuration {
    pub fn from_json(payload: &str) -> crate::Result<Configuration> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Experiments that parsed successfully. The rest are logged and skipped.
    pub fn into_experiments(self) -> Vec<ExperimentModel> {
        self.experiments
            .into_iter()
            .filter_map(|experiment| {
                if let TryParse::ParseFailed(value) = &experiment {
                    log::warn!(target: "rox",
                               experiment:serde = value;
                               "skipping experiment that failed to parse");
                }
                Option::<ExperimentModel>::from(experiment)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Configuration, TryParse};
    use crate::{Error, ExperimentModel};

    #[test]
    fn malformed_experiment_is_skipped() {
        let configuration = Configuration::from_json(
            r#"{
                "experiments": [
                    {
                        "_id": "1",
                        "name": "good",
                        "archived": false,
                        "labels": [],
                        "featureFlags": [{"name": "a"}],
                        "deploymentConfiguration": {"condition": "true"}
                    },
                    {"_id": 2, "name": "bad"}
                ]
            }"#,
        )
        .unwrap();

        let experiments = configuration.into_experiments();
        assert_eq!(experiments.len(), 1);
        assert_eq!(experiments[0].name, "good");
    }

    #[test]
    fn missing_experiments_is_empty() {
        let configuration = Configuration::from_json("{}").unwrap();
        assert!(configuration.into_experiments().is_empty());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(
            Configuration::from_json("not json"),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn try_parse_into_option() {
        let parsed: Option<ExperimentModel> =
            serde_json::from_str::<TryParse<ExperimentModel>>(r#"{"name": "no id"}"#)
                .unwrap()
                .into();
        assert!(parsed.is_none());
    }
}
