//! Site-wide settings.

use serde::Deserialize;
use store::{Settings, Store};

use crate::error::Result;
use crate::validation::optional_text;

/// Partial settings update. Absent fields keep their stored value; blank
/// strings clear optional fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub site_name: Option<String>,
    pub logo: Option<String>,
    pub favicon: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub google_login_key: Option<String>,
    pub iyzico_key: Option<String>,
    pub iyzico_secret_key: Option<String>,
    pub iyzico_sandbox_mode: Option<bool>,
    pub paytr_key: Option<String>,
    pub paytr_salt: Option<String>,
    pub paytr_merchant_id: Option<String>,
    pub sms_api_key: Option<String>,
    pub sms_api_secret: Option<String>,
    pub sms_api_sender: Option<String>,
    pub navbar_color: Option<String>,
    pub footer_color: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub google_analytics_id: Option<String>,
    pub google_console_id: Option<String>,
}

fn set_optional(target: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        *target = optional_text(Some(value));
    }
}

fn set_required(target: &mut String, value: Option<String>) {
    if let Some(value) = optional_text(value) {
        *target = value;
    }
}

impl SettingsPatch {
    /// Applies the present fields onto `settings`.
    pub fn apply(self, settings: &mut Settings) {
        set_required(&mut settings.site_name, self.site_name);
        set_optional(&mut settings.logo, self.logo);
        set_optional(&mut settings.favicon, self.favicon);
        set_optional(&mut settings.email, self.email);
        set_optional(&mut settings.phone, self.phone);
        set_optional(&mut settings.address, self.address);
        set_optional(&mut settings.meta_title, self.meta_title);
        set_optional(&mut settings.meta_description, self.meta_description);
        set_optional(&mut settings.google_login_key, self.google_login_key);
        set_optional(&mut settings.iyzico_key, self.iyzico_key);
        set_optional(&mut settings.iyzico_secret_key, self.iyzico_secret_key);
        if let Some(sandbox) = self.iyzico_sandbox_mode {
            settings.iyzico_sandbox_mode = sandbox;
        }
        set_optional(&mut settings.paytr_key, self.paytr_key);
        set_optional(&mut settings.paytr_salt, self.paytr_salt);
        set_optional(&mut settings.paytr_merchant_id, self.paytr_merchant_id);
        set_optional(&mut settings.sms_api_key, self.sms_api_key);
        set_optional(&mut settings.sms_api_secret, self.sms_api_secret);
        set_optional(&mut settings.sms_api_sender, self.sms_api_sender);
        set_required(&mut settings.navbar_color, self.navbar_color);
        set_required(&mut settings.footer_color, self.footer_color);
        set_required(&mut settings.primary_color, self.primary_color);
        set_required(&mut settings.secondary_color, self.secondary_color);
        set_optional(&mut settings.google_analytics_id, self.google_analytics_id);
        set_optional(&mut settings.google_console_id, self.google_console_id);
    }
}

pub struct SettingsService<S: Store> {
    store: S,
}

impl<S: Store> SettingsService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the settings, creating the default row on first use.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self) -> Result<Settings> {
        Ok(self.store.get_or_create_settings().await?)
    }

    #[tracing::instrument(skip(self, patch))]
    pub async fn update(&self, patch: SettingsPatch) -> Result<Settings> {
        let mut settings = self.store.get_or_create_settings().await?;
        patch.apply(&mut settings);
        let saved = self.store.save_settings(&settings).await?;
        tracing::info!("settings updated");
        Ok(saved)
    }

    /// Records uploaded branding asset paths. `None` leaves a field as is.
    #[tracing::instrument(skip(self))]
    pub async fn set_branding(
        &self,
        logo: Option<String>,
        favicon: Option<String>,
    ) -> Result<Settings> {
        if logo.is_none() && favicon.is_none() {
            return self.get().await;
        }
        self.update(SettingsPatch {
            logo,
            favicon,
            ..Default::default()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::InMemoryStore;

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let service = SettingsService::new(InMemoryStore::new());
        service
            .update(SettingsPatch {
                email: Some("info@restoran.test".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let updated = service
            .update(SettingsPatch {
                iyzico_key: Some("sandbox-key".into()),
                iyzico_sandbox_mode: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.email.as_deref(), Some("info@restoran.test"));
        assert_eq!(updated.iyzico_key.as_deref(), Some("sandbox-key"));
        assert!(updated.iyzico_sandbox_mode);
        assert_eq!(updated.site_name, "RestoranX");
    }

    #[test]
    fn blank_clears_optional_but_not_required() {
        let mut settings = Settings {
            phone: Some("+90 212 000 00 00".into()),
            ..Default::default()
        };

        SettingsPatch {
            phone: Some("".into()),
            site_name: Some("  ".into()),
            primary_color: Some("#000000".into()),
            ..Default::default()
        }
        .apply(&mut settings);

        assert_eq!(settings.phone, None);
        assert_eq!(settings.site_name, "RestoranX");
        assert_eq!(settings.primary_color, "#000000");
    }
}
