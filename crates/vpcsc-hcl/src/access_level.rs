//! Access-level module declarations.

use vpcsc_core::AccessLevelModule;

use crate::value::{Block, HclValue};

/// Module label prefix; the access-level name is appended.
pub const MODULE_LABEL_PREFIX: &str = "vpc-service-controls-access-level_";

/// Render one access-level module binding `name` to a single IP.
pub fn access_level_block(name: &str, ip: &str, module: &AccessLevelModule) -> String {
    Block {
        kind: "module".to_string(),
        labels: vec![format!("{MODULE_LABEL_PREFIX}{name}")],
        attributes: vec![
            ("source".to_string(), HclValue::from(module.source.as_str())),
            ("version".to_string(), HclValue::from(module.version.as_str())),
            (
                "policy".to_string(),
                HclValue::Expression("var.policy".to_string()),
            ),
            ("name".to_string(), HclValue::from(name)),
            ("ip_subnetworks".to_string(), HclValue::strings([ip])),
        ],
    }
    .render()
}
