//! Bundled, hand-curated minimal specification used when no live or cached
//! data is reachable.
//!
//! Lookup is exact on the derived identifier first, then fuzzy substring
//! containment in both directions on the normalized name. The fuzzy step is
//! a documented heuristic, not a correctness guarantee: short names can
//! match unintended sections, so callers should prefer exact identifiers.

use crate::model::{SpecDocument, derive_identifier};
use serde_json::json;

/// Static fallback catalog over a fixed set of common sections.
#[derive(Debug)]
pub struct FallbackCatalog {
    entries: Vec<(&'static str, SpecDocument)>,
}

impl Default for FallbackCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackCatalog {
    pub fn new() -> Self {
        Self {
            entries: vec![
                ("wifi", wifi_document()),
                ("vpn", vpn_document()),
                ("mail", mail_document()),
                ("restrictions", restrictions_document()),
            ],
        }
    }

    /// The fallback main specification: a skeletal topic-section tree
    /// covering the bundled sections.
    pub fn main_document(&self) -> SpecDocument {
        SpecDocument::from_value(json!({
            "topicSections": [
                {
                    "title": "Networking",
                    "anchor": "networking",
                    "identifiers": [
                        "doc://com.apple.devicemanagement/documentation/DeviceManagement/WiFi",
                        "doc://com.apple.devicemanagement/documentation/DeviceManagement/VPN"
                    ]
                },
                {
                    "title": "Mail",
                    "anchor": "mail",
                    "identifiers": [
                        "doc://com.apple.devicemanagement/documentation/DeviceManagement/Mail"
                    ]
                },
                {
                    "title": "Restrictions",
                    "anchor": "restrictions",
                    "identifiers": [
                        "doc://com.apple.devicemanagement/documentation/DeviceManagement/Restrictions"
                    ]
                }
            ],
            "references": {
                "doc://com.apple.devicemanagement/documentation/DeviceManagement/WiFi": {
                    "title": "WiFi",
                    "abstract": "Wireless network settings.",
                    "kind": "symbol",
                    "platforms": ["iOS", "macOS", "tvOS", "watchOS"]
                },
                "doc://com.apple.devicemanagement/documentation/DeviceManagement/VPN": {
                    "title": "VPN",
                    "abstract": "Virtual private network settings.",
                    "kind": "symbol",
                    "platforms": ["iOS", "macOS"]
                },
                "doc://com.apple.devicemanagement/documentation/DeviceManagement/Mail": {
                    "title": "Mail",
                    "abstract": "Mail account settings.",
                    "kind": "symbol",
                    "platforms": ["iOS", "macOS"]
                },
                "doc://com.apple.devicemanagement/documentation/DeviceManagement/Restrictions": {
                    "title": "Restrictions",
                    "abstract": "Feature restriction settings.",
                    "kind": "symbol",
                    "platforms": ["iOS", "macOS", "tvOS"]
                }
            }
        }))
    }

    /// Look up a section document by name: exact identifier match, then
    /// fuzzy bidirectional substring containment.
    pub fn section(&self, name: &str) -> Option<SpecDocument> {
        let wanted = derive_identifier(name);
        if wanted.is_empty() {
            return None;
        }
        if let Some((_, doc)) = self.entries.iter().find(|(id, _)| *id == wanted) {
            return Some(doc.clone());
        }
        self.entries
            .iter()
            .find(|(id, _)| id.contains(&wanted) || wanted.contains(*id))
            .map(|(_, doc)| doc.clone())
    }
}

fn wifi_document() -> SpecDocument {
    SpecDocument::from_value(json!({
        "topicSections": [],
        "references": {},
        "parameters": {
            "SSID_STR": {
                "type": "string",
                "description": "The SSID of the Wi-Fi network.",
                "required": true
            },
            "Password": {
                "type": "string",
                "description": "The password for the network."
            },
            "EncryptionType": {
                "type": "string",
                "description": "The encryption to use for the network.",
                "enum": ["WEP", "WPA", "WPA2", "WPA3", "Any", "None"],
                "required": true
            },
            "IsHiddenNetwork": {
                "type": "boolean",
                "description": "Whether the network broadcasts its SSID.",
                "default": false
            },
            "AutoJoin": {
                "type": "boolean",
                "description": "Whether the device joins the network automatically.",
                "default": true
            }
        }
    }))
}

fn vpn_document() -> SpecDocument {
    SpecDocument::from_value(json!({
        "topicSections": [],
        "references": {},
        "parameters": {
            "UserDefinedName": {
                "type": "string",
                "description": "Display name of the VPN connection.",
                "required": true
            },
            "VPNType": {
                "type": "string",
                "description": "The VPN protocol.",
                "enum": ["IKEv2", "L2TP", "IPSec", "VPN"],
                "required": true
            },
            "RemoteAddress": {
                "type": "string",
                "description": "Hostname or address of the VPN server."
            },
            "OnDemandEnabled": {
                "type": "integer",
                "description": "Whether the connection starts on demand.",
                "default": 0
            }
        }
    }))
}

fn mail_document() -> SpecDocument {
    SpecDocument::from_value(json!({
        "topicSections": [],
        "references": {},
        "parameters": {
            "EmailAccountDescription": {
                "type": "string",
                "description": "Display name of the account."
            },
            "EmailAccountType": {
                "type": "string",
                "description": "The mail protocol for the account.",
                "enum": ["EmailTypePOP", "EmailTypeIMAP"],
                "required": true
            },
            "EmailAddress": {
                "type": "string",
                "description": "The address of the account."
            },
            "IncomingMailServerHostName": {
                "type": "string",
                "description": "Hostname of the incoming mail server.",
                "required": true
            },
            "IncomingMailServerPortNumber": {
                "type": "integer",
                "description": "Port of the incoming mail server."
            }
        }
    }))
}

fn restrictions_document() -> SpecDocument {
    SpecDocument::from_value(json!({
        "topicSections": [],
        "references": {},
        "parameters": {
            "allowCamera": {
                "type": "boolean",
                "description": "Whether the camera is available.",
                "default": true
            },
            "allowScreenShot": {
                "type": "boolean",
                "description": "Whether screenshots are allowed.",
                "default": true
            },
            "allowAppInstallation": {
                "type": "boolean",
                "description": "Whether installing apps is allowed.",
                "default": true
            },
            "ratingRegion": {
                "type": "string",
                "description": "Region code used for media ratings."
            }
        }
    }))
}
