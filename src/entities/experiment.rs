use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Experiment as delivered by configuration: a targeting condition bound to a set of flags.
///
/// Immutable after construction. A configuration refresh replaces all models at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentModel {
    /// Experiment id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Targeting expression.
    #[serde(rename = "deploymentConfiguration", with = "deployment_configuration")]
    pub condition: String,
    /// Archived experiments still target flags but are not sent to analytics.
    #[serde(default, rename = "archived")]
    pub is_archived: bool,
    /// Names of the flags this experiment controls.
    #[serde(rename = "featureFlags", with = "feature_flags")]
    pub flags: BTreeSet<String>,
    /// Free-form labels.
    #[serde(default)]
    pub labels: Vec<String>,
}

impl ExperimentModel {
    /// Create a model, as if it had been read from a configuration payload.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        condition: impl Into<String>,
        is_archived: bool,
        flags: impl IntoIterator<Item = impl Into<String>>,
        labels: impl IntoIterator<Item = impl Into<String>>,
    ) -> ExperimentModel {
        ExperimentModel {
            id: id.into(),
            name: name.into(),
            condition: condition.into(),
            is_archived,
            flags: flags.into_iter().map(Into::into).collect(),
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }
}

/// Runtime projection of an [`ExperimentModel`], as seen by evaluation and impressions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    /// Experiment id.
    pub identifier: String,
    /// Display name.
    pub name: String,
    /// Whether the experiment is archived.
    pub is_archived: bool,
    /// Free-form labels.
    pub labels: Vec<String>,
}

impl From<&ExperimentModel> for Experiment {
    fn from(model: &ExperimentModel) -> Experiment {
        Experiment {
            identifier: model.id.clone(),
            name: model.name.clone(),
            is_archived: model.is_archived,
            labels: model.labels.clone(),
        }
    }
}

/// `"deploymentConfiguration": {"condition": "..."}` on the wire.
mod deployment_configuration {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct DeploymentConfiguration<T> {
        condition: T,
    }

    pub fn serialize<S: Serializer>(condition: &str, serializer: S) -> Result<S::Ok, S::Error> {
        DeploymentConfiguration { condition }.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        DeploymentConfiguration::<String>::deserialize(deserializer).map(|it| it.condition)
    }
}

/// `"featureFlags": [{"name": "..."}]` on the wire.
mod feature_flags {
    use std::collections::BTreeSet;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct FeatureFlag<T> {
        name: T,
    }

    pub fn serialize<S: Serializer>(
        flags: &BTreeSet<String>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(flags.iter().map(|name| FeatureFlag { name }))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeSet<String>, D::Error> {
        let flags = Vec::<FeatureFlag<String>>::deserialize(deserializer)?;
        Ok(flags.into_iter().map(|it| it.name).collect())
    }
}
