//! Navigation settings (languages, guest WiFi, social links) and video
//! mapping payloads

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::{Validate, ValidationError};

/// Language offered in the language switcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSetting {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub flag: String,
    pub enabled: bool,
}

/// Guest WiFi shown as a QR code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiSettings {
    pub ssid: String,
    pub password: String,
    pub enabled: bool,
}

impl WifiSettings {
    /// `WIFI:` payload understood by phone cameras
    pub fn qr_payload(&self) -> String {
        fn escape(s: &str) -> String {
            s.chars()
                .flat_map(|c| match c {
                    '\\' | ';' | ',' | ':' | '"' => vec!['\\', c],
                    _ => vec![c],
                })
                .collect()
        }
        if self.password.is_empty() {
            format!("WIFI:T:nopass;S:{};;", escape(&self.ssid))
        } else {
            format!(
                "WIFI:T:WPA;S:{};P:{};;",
                escape(&self.ssid),
                escape(&self.password)
            )
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub icon: String,
    pub enabled: bool,
}

/// Contents of `navigationSettings.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_navigation_settings"))]
pub struct NavigationSettings {
    pub languages: Vec<LanguageSetting>,
    pub wifi: WifiSettings,
    pub social_media: Vec<SocialLink>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn validate_navigation_settings(s: &NavigationSettings) -> Result<(), ValidationError> {
    if !s.languages.iter().any(|l| l.enabled) {
        return Err(ValidationError::new("no_language_enabled"));
    }
    Ok(())
}

fn language(code: &str, name: &str, flag: &str, enabled: bool) -> LanguageSetting {
    LanguageSetting {
        code: code.to_string(),
        name: name.to_string(),
        flag: flag.to_string(),
        enabled,
    }
}

fn social(id: &str, name: &str, icon: &str, enabled: bool) -> SocialLink {
    SocialLink {
        id: id.to_string(),
        name: name.to_string(),
        url: format!("https://{}.com/safiralounge", id),
        icon: icon.to_string(),
        enabled,
    }
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            languages: vec![
                language("de", "Deutsch", "🇩🇪", true),
                language("en", "English", "🇬🇧", true),
                language("da", "Dansk", "🇩🇰", true),
                language("tr", "Türkçe", "🇹🇷", true),
                language("it", "Italiano", "🇮🇹", true),
                language("fr", "Français", "🇫🇷", false),
                language("es", "Español", "🇪🇸", false),
                language("pt", "Português", "🇵🇹", false),
                language("nl", "Nederlands", "🇳🇱", false),
                language("pl", "Polski", "🇵🇱", false),
                language("ru", "Русский", "🇷🇺", false),
                language("ar", "العربية", "🇸🇦", false),
            ],
            wifi: WifiSettings {
                ssid: "Safira Lounge".to_string(),
                password: "Safira123".to_string(),
                enabled: true,
            },
            social_media: vec![
                social("instagram", "Instagram", "📸", true),
                social("facebook", "Facebook", "👤", true),
                social("twitter", "Twitter", "🐦", false),
                social("youtube", "YouTube", "📺", false),
            ],
            extra: Map::new(),
        }
    }
}

impl NavigationSettings {
    pub fn enabled_languages(&self) -> Vec<LanguageSetting> {
        self.languages.iter().filter(|l| l.enabled).cloned().collect()
    }

    pub fn enabled_social_links(&self) -> Vec<SocialLink> {
        self.social_media
            .iter()
            .filter(|s| s.enabled)
            .cloned()
            .collect()
    }
}

/// One row of the server's video mapping list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMapping {
    pub category_id: String,
    pub video_path: String,
}

/// Body of `GET /api/products?action=get_video_mappings`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMappingList {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub mappings: Vec<VideoMapping>,
}

impl VideoMappingList {
    pub const SUCCESS: &'static str = "success";

    pub fn success(mappings: Vec<VideoMapping>) -> Self {
        Self {
            status: Self::SUCCESS.to_string(),
            mappings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = NavigationSettings::default();
        assert!(settings.validate().is_ok());
        let codes: Vec<String> = settings
            .enabled_languages()
            .into_iter()
            .map(|l| l.code)
            .collect();
        assert_eq!(codes, ["de", "en", "da", "tr", "it"]);
        assert_eq!(settings.enabled_social_links().len(), 2);
        assert_eq!(
            settings.social_media[0].url,
            "https://instagram.com/safiralounge"
        );
    }

    #[test]
    fn test_at_least_one_language_enabled() {
        let mut settings = NavigationSettings::default();
        for lang in &mut settings.languages {
            lang.enabled = false;
        }
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(NavigationSettings::default()).unwrap();
        assert!(json["socialMedia"].is_array());
        assert_eq!(json["wifi"]["ssid"], "Safira Lounge");

        let missing_wifi = serde_json::json!({ "languages": [], "socialMedia": [] });
        assert!(serde_json::from_value::<NavigationSettings>(missing_wifi).is_err());
    }

    #[test]
    fn test_wifi_qr_payload() {
        let wifi = WifiSettings {
            ssid: "Lounge;1".to_string(),
            password: "pw".to_string(),
            enabled: true,
        };
        assert_eq!(wifi.qr_payload(), r"WIFI:T:WPA;S:Lounge\;1;P:pw;;");

        let open = WifiSettings {
            password: String::new(),
            ..wifi
        };
        assert_eq!(open.qr_payload(), r"WIFI:T:nopass;S:Lounge\;1;;");
    }
}
