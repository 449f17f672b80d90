//! Defaults derived from the caller's identity.

use crate::{common::*, error::LaunchError, service::IdentityProvider};

/// The repository and tag of the distributed Detectron2 training image.
pub const DEFAULT_IMAGE_REPOSITORY: &str = "d2-sm-coco:distributed";

/// The account and principal that issues the requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account: String,
    /// The principal ARN, e.g. `arn:aws:sts::123456789012:assumed-role/Role/session`.
    pub arn: String,
}

impl CallerIdentity {
    /// The training image in the caller's container registry.
    pub fn default_image(&self, region: &str) -> String {
        format!(
            "{}.dkr.ecr.{}.amazonaws.com/{}",
            self.account, region, DEFAULT_IMAGE_REPOSITORY
        )
    }

    /// The IAM role behind the caller.
    ///
    /// Role ARNs are kept as is. An assumed-role session ARN names its role
    /// without the IAM path. Other principals cannot be passed to the
    /// training service.
    pub fn role(&self) -> Result<CallerRole> {
        let unsupported = || LaunchError::UnsupportedIdentity(self.arn.clone());

        let parts: Vec<&str> = self.arn.splitn(6, ':').collect();
        let (partition, service, account, resource) = match parts.as_slice() {
            ["arn", partition, service, _region, account, resource] => {
                (*partition, *service, *account, *resource)
            }
            _ => return Err(unsupported().into()),
        };

        match service {
            "iam" if resource.starts_with("role/") => Ok(CallerRole::Role(self.arn.clone())),
            "sts" => {
                let name = resource
                    .strip_prefix("assumed-role/")
                    .and_then(|rest| rest.split('/').next())
                    .filter(|name| !name.is_empty())
                    .ok_or_else(unsupported)?;
                Ok(CallerRole::AssumedRole {
                    name: name.to_owned(),
                    arn_without_path: format!("arn:{}:iam::{}:role/{}", partition, account, name),
                })
            }
            _ => Err(unsupported().into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerRole {
    /// The caller is the role itself.
    Role(String),
    /// The caller is a session of the named role.
    AssumedRole {
        name: String,
        /// The role ARN rebuilt from the session ARN, missing the IAM path if
        /// the role has one.
        arn_without_path: String,
    },
}

/// Resolves the ARN of the role behind the caller.
///
/// The role of an assumed-role session is looked up to recover its IAM path,
/// e.g. `role/service-role/...`. When the lookup fails, the ARN rebuilt from
/// the session is used instead.
pub async fn resolve_role_arn<I>(caller: &CallerIdentity, provider: &I) -> Result<String>
where
    I: IdentityProvider + ?Sized,
{
    let (name, arn_without_path) = match caller.role()? {
        CallerRole::Role(arn) => return Ok(arn),
        CallerRole::AssumedRole {
            name,
            arn_without_path,
        } => (name, arn_without_path),
    };

    match provider.role_arn(&name).await {
        Ok(arn) => {
            debug!("resolved role '{}' to '{}'", name, arn);
            Ok(arn)
        }
        Err(err) => {
            warn!(
                "unable to look up role '{}', use '{}' instead: {:#}",
                name, arn_without_path, err
            );
            Ok(arn_without_path)
        }
    }
}
