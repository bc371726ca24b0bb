//! Site settings singleton

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Contact and address metadata shown on the portal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSettings {
    pub site_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub updated_at: DateTime<Utc>,
}

impl SiteSettings {
    /// Values used when the singleton is first created
    pub fn initial() -> Self {
        Self {
            site_name: "Bankdesk".to_string(),
            contact_email: String::new(),
            contact_phone: String::new(),
            address: String::new(),
            city: String::new(),
            country: String::new(),
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SiteSettingsChanges {
    pub site_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl SiteSettingsChanges {
    pub fn apply_to(&self, settings: &mut SiteSettings) {
        let fields = [
            (&mut settings.site_name, &self.site_name),
            (&mut settings.contact_email, &self.contact_email),
            (&mut settings.contact_phone, &self.contact_phone),
            (&mut settings.address, &self.address),
            (&mut settings.city, &self.city),
            (&mut settings.country, &self.country),
        ];
        for (target, value) in fields {
            if let Some(v) = value {
                *target = v.trim().to_string();
            }
        }
        settings.updated_at = Utc::now();
    }
}
