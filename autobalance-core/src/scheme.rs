//! Input scheme declaration
//!
//! Describes the options an input accepts so the host scheduler can render
//! and store them. Serialized as JSON by the `scheme` command.

use serde::Serialize;

/// Option value type as understood by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentType {
    Number,
    String,
    Boolean,
}

/// One declared input option
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Argument {
    pub name: &'static str,
    pub data_type: ArgumentType,
    pub description: &'static str,
    pub required_on_create: bool,
    pub required_on_edit: bool,
}

impl Argument {
    /// An optional argument, which is all this scheme declares
    const fn optional(
        name: &'static str,
        data_type: ArgumentType,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            data_type,
            description,
            required_on_create: false,
            required_on_edit: false,
        }
    }
}

/// The full scheme for the rebalance input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputScheme {
    pub title: &'static str,
    pub description: &'static str,
    pub use_external_validation: bool,
    pub streaming_mode_xml: bool,
    pub use_single_instance: bool,
    pub arguments: Vec<Argument>,
}

impl InputScheme {
    pub fn rebalance() -> Self {
        use ArgumentType::*;

        Self {
            title: "Automatic Data Rebalance",
            description: "Trigger a data rebalance when the indexer clusters search factor is met",
            use_external_validation: false,
            streaming_mode_xml: true,
            use_single_instance: false,
            arguments: vec![
                Argument::optional(
                    "threshold",
                    Number,
                    "Threshold (rebalance_threshold) value, defaults to 0.9",
                ),
                Argument::optional(
                    "max_runtime",
                    Number,
                    "Maximum runtime to run the data rebalance, defaults to unlimited",
                ),
                Argument::optional(
                    "target_index",
                    String,
                    "Index to rebalance, defaults to all indexes",
                ),
                Argument::optional(
                    "searchable",
                    Boolean,
                    "Whether to use searchable mode, defaults to False",
                ),
                Argument::optional(
                    "usage_based",
                    Boolean,
                    "Whether to use the new usage based data rebalance, defaults to False",
                ),
                Argument::optional("debug", Boolean, "Enables debug logging"),
                Argument::optional(
                    "excess_buckets",
                    Boolean,
                    "If set to true this triggers the removal of all excess buckets instead of a data rebalance, defaults to False",
                ),
            ],
        }
    }

    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().find(|a| a.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_declares_every_option() {
        let scheme = InputScheme::rebalance();
        for name in [
            "threshold",
            "max_runtime",
            "target_index",
            "searchable",
            "usage_based",
            "debug",
            "excess_buckets",
        ] {
            let arg = scheme.argument(name).expect(name);
            assert!(!arg.required_on_create);
            assert!(!arg.required_on_edit);
        }
        assert_eq!(scheme.arguments.len(), 7);
    }

    #[test]
    fn test_scheme_serializes_types_lowercase() {
        let json = serde_json::to_value(InputScheme::rebalance()).unwrap();
        assert_eq!(json["arguments"][0]["data_type"], "number");
        assert_eq!(json["arguments"][2]["data_type"], "string");
        assert_eq!(json["streaming_mode_xml"], true);
    }
}
