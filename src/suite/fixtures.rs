//! Group prerequisites. Each fixture creates what its group needs and hands
//! the identifiers to the group's scenarios.

use std::path::Path;

use tracing::{info, warn};

use super::{QUALIFICATION_NAME, ScenarioResult, ensure};
use crate::client::Client;
use crate::fixture::hit_params;
use crate::model::{NewQualificationType, QualificationTypeStatus};

/// A freshly created, assignable HIT.
#[derive(Debug, Clone)]
pub struct HitFixture {
    pub hit_id: String,
}

impl HitFixture {
    pub async fn setup(client: &Client, template: &Path) -> ScenarioResult<Self> {
        let hit = client.create_hit(&hit_params(template)?).await?;
        info!(hit_id = %hit.hit_id, "created HIT");
        Ok(Self { hit_id: hit.hit_id })
    }
}

/// A HIT that has been force-expired and is therefore reviewable.
#[derive(Debug, Clone)]
pub struct ExpiredHitFixture {
    pub hit_id: String,
}

impl ExpiredHitFixture {
    pub async fn setup(client: &Client, template: &Path) -> ScenarioResult<Self> {
        let HitFixture { hit_id } = HitFixture::setup(client, template).await?;
        client.force_expire_hit(&hit_id).await?;
        Ok(Self { hit_id })
    }
}

#[derive(Debug, Clone)]
pub struct HitTypeFixture {
    pub hit_type_id: String,
}

impl HitTypeFixture {
    pub async fn setup(client: &Client, template: &Path) -> ScenarioResult<Self> {
        let registered = client
            .register_hit_type(&hit_params(template)?.hit_type())
            .await?;
        ensure(registered.request.is_valid, || {
            "RegisterHITType was not valid".to_string()
        })?;
        Ok(Self {
            hit_type_id: registered.hit_type_id,
        })
    }
}

/// A registered HIT type plus an unrelated HIT that can be moved onto it.
#[derive(Debug, Clone)]
pub struct HitAndTypeFixture {
    pub hit_id: String,
    pub hit_type_id: String,
}

impl HitAndTypeFixture {
    pub async fn setup(client: &Client, template: &Path) -> ScenarioResult<Self> {
        let HitTypeFixture { hit_type_id } = HitTypeFixture::setup(client, template).await?;
        let HitFixture { hit_id } = HitFixture::setup(client, template).await?;
        Ok(Self {
            hit_id,
            hit_type_id,
        })
    }
}

/// The qualification type the qualification lifecycle walks through.
#[derive(Debug, Clone)]
pub struct QualificationFixture {
    pub qualification_type_id: String,
    disposed: bool,
}

impl QualificationFixture {
    pub fn new_type() -> NewQualificationType {
        NewQualificationType {
            name: QUALIFICATION_NAME.to_string(),
            description: "THIS IS A SANDBOX QUALIFICATION FOR TESTING PURPOSES".to_string(),
            qualification_type_status: QualificationTypeStatus::Active,
            keywords: None,
        }
    }

    pub async fn setup(client: &Client) -> ScenarioResult<Self> {
        let created = client.create_qualification_type(&Self::new_type()).await?;
        ensure(!created.qualification_type_id.is_empty(), || {
            "QualificationTypeId is empty".to_string()
        })?;
        Ok(Self {
            qualification_type_id: created.qualification_type_id,
            disposed: false,
        })
    }

    /// Mark the type as disposed by a scenario so teardown leaves it alone.
    pub fn disposed(&mut self) {
        self.disposed = true;
    }

    /// Dispose the type unless a scenario already did. Failures are logged;
    /// a leftover type only blocks reuse of its name.
    pub async fn teardown(self, client: &Client) {
        if self.disposed {
            return;
        }
        if let Err(e) = client
            .dispose_qualification_type(&self.qualification_type_id)
            .await
        {
            warn!(
                qualification_type_id = %self.qualification_type_id,
                error = %e,
                "could not dispose qualification type"
            );
        }
    }
}
