//! Project dialect detection

use log::debug;
use semver::Version;
use serde_json::Value;

use crate::error::{ConvertError, Result};
use crate::types::Dialect;

/// `type` of projects created by the siesta annotation app
pub const SIESTA_PROJECT_TYPE: &str = "image-siesta";
/// `type` of death-valley projects; also assumed when `type` is absent
pub const DEFAULT_PROJECT_TYPE: &str = "image-default";
/// First siesta version using the snake_case label schema
pub const SIESTA_V2_VERSION: Version = Version::new(0, 4, 0);

/// Determine which schema dialect produced `project`.
pub fn detect_dialect(project: &Value) -> Result<Dialect> {
    let project_type = match project.get("type") {
        None | Some(Value::Null) => DEFAULT_PROJECT_TYPE,
        Some(Value::String(t)) => t.as_str(),
        Some(other) => {
            return Err(ConvertError::unsupported_schema(format!(
                "project type {} is not a string",
                other
            )))
        }
    };

    let dialect = match project_type {
        SIESTA_PROJECT_TYPE => siesta_dialect(project)?,
        DEFAULT_PROJECT_TYPE => Dialect::DeathValley,
        other => {
            return Err(ConvertError::unsupported_schema(format!(
                "unknown project type '{}'",
                other
            )))
        }
    };
    debug!("Project type '{}' uses dialect {}", project_type, dialect);
    Ok(dialect)
}

fn siesta_dialect(project: &Value) -> Result<Dialect> {
    let version = project
        .get("version")
        .and_then(Value::as_str)
        .ok_or_else(|| ConvertError::schema("siesta project has no string 'version'"))?;
    let version = Version::parse(version)?;

    if version < SIESTA_V2_VERSION {
        Ok(Dialect::SiestaV1)
    } else {
        Ok(Dialect::SiestaV2)
    }
}
