use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Door-fob entry counts for one week, keyed by the day label of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FobData {
    pub week: String,
    pub data: BTreeMap<String, String>,
}
