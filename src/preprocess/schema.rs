// src/preprocess/schema.rs

/// A bounded-domain column: values outside `valid` are treated as missing.
#[derive(Debug, Clone, PartialEq)]
pub struct SentinelRule {
    pub column: String,
    pub valid: Vec<f64>,
}

/// Column roles of the source dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    /// Scaled, outlier-checked and VIF-pruned, in this order.
    pub continuous: Vec<String>,
    /// Categorical then binary columns, chi-square tested in this order.
    pub selectable: Vec<String>,
    pub label: String,
    pub sentinels: Vec<SentinelRule>,
}

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl FeatureSchema {
    /// The 14-column heart disease dataset.
    pub fn heart() -> Self {
        Self {
            continuous: names(&["age", "trestbps", "chol", "thalach", "oldpeak"]),
            selectable: names(&["cp", "restecg", "slope", "ca", "thal", "sex", "fbs", "exang"]),
            label: "target".to_string(),
            sentinels: vec![
                SentinelRule {
                    column: "ca".to_string(),
                    valid: vec![0.0, 1.0, 2.0, 3.0],
                },
                SentinelRule {
                    column: "thal".to_string(),
                    valid: vec![1.0, 2.0, 3.0],
                },
            ],
        }
    }

    /// Every column the source CSV carries, in file order.
    pub fn source_columns() -> &'static [&'static str] {
        &[
            "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang",
            "oldpeak", "slope", "ca", "thal", "target",
        ]
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::heart()
    }
}
