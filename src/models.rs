//! Request and response payloads of the compliance API.
//!
//! Response models decode leniently: missing fields become `None` or empty
//! and unknown fields are ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{PageRef, PagedResponse};

/// A profile: a versioned set of controls with default parameter values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub id: Option<String>,
    pub profile_name: Option<String>,
    pub profile_description: Option<String>,
    pub profile_type: Option<String>,
    pub profile_version: Option<String>,
    pub version_group_label: Option<String>,
    pub instance_id: Option<String>,
    pub latest: Option<bool>,
    pub hierarchy_enabled: Option<bool>,
    pub created_by: Option<String>,
    pub created_on: Option<String>,
    pub updated_by: Option<String>,
    pub updated_on: Option<String>,
    pub controls_count: Option<i64>,
    pub control_parents_count: Option<i64>,
    pub attachments_count: Option<i64>,
    pub controls: Vec<ProfileControl>,
    pub default_parameters: Vec<DefaultParameter>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileControl {
    pub control_library_id: Option<String>,
    pub control_id: Option<String>,
    pub control_library_version: Option<String>,
    pub control_name: Option<String>,
    pub control_description: Option<String>,
    pub control_category: Option<String>,
    pub control_parent: Option<String>,
    pub control_requirement: Option<bool>,
    pub control_docs: Option<JsonValue>,
    pub control_specifications_count: Option<i64>,
    pub control_specifications: Vec<JsonValue>,
}

/// Default value of an assessment parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultParameter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_default_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_type: Option<String>,
}

/// Control reference used when creating or replacing a profile.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileControlsPrototype {
    pub control_library_id: String,
    pub control_id: String,
}

/// Body of `CreateProfile` and `ReplaceProfile`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePrototype {
    pub profile_name: String,
    pub profile_description: String,
    pub profile_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_group_label: Option<String>,
    pub controls: Vec<ProfileControlsPrototype>,
    pub default_parameters: Vec<DefaultParameter>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileCollection {
    pub limit: Option<i64>,
    pub total_count: Option<i64>,
    pub first: Option<PageRef>,
    pub next: Option<PageRef>,
    pub profiles: Vec<Profile>,
}

impl PagedResponse for ProfileCollection {
    type Item = Profile;

    fn next_page(&self) -> Option<&PageRef> {
        self.next.as_ref()
    }

    fn into_items(self) -> Vec<Profile> {
        self.profiles
    }
}

/// A profile attached to a scope, with its scan schedule.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attachment {
    pub id: Option<String>,
    pub profile_id: Option<String>,
    pub account_id: Option<String>,
    pub instance_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub scope: Vec<JsonValue>,
    pub schedule: Option<String>,
    pub status: Option<String>,
    pub notifications: Option<JsonValue>,
    pub attachment_parameters: Vec<AttachmentParameter>,
    pub last_scan: Option<JsonValue>,
    pub next_scan_time: Option<String>,
    pub created_on: Option<String>,
    pub created_by: Option<String>,
    pub updated_on: Option<String>,
    pub updated_by: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentParameter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_type: Option<String>,
}

/// One attachment definition, as sent to `CreateAttachment` and
/// `ReplaceProfileAttachment`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentsPrototype {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub scope: Vec<JsonValue>,
    pub status: String,
    pub schedule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<JsonValue>,
    pub attachment_parameters: Vec<AttachmentParameter>,
}

/// Body and response of `CreateAttachment`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentPrototype {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    pub attachments: Vec<AttachmentsPrototype>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentCollection {
    pub limit: Option<i64>,
    pub total_count: Option<i64>,
    pub first: Option<PageRef>,
    pub next: Option<PageRef>,
    pub attachments: Vec<Attachment>,
}

impl PagedResponse for AttachmentCollection {
    type Item = Attachment;

    fn next_page(&self) -> Option<&PageRef> {
        self.next.as_ref()
    }

    fn into_items(self) -> Vec<Attachment> {
        self.attachments
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlLibrary {
    pub id: Option<String>,
    pub account_id: Option<String>,
    pub control_library_name: Option<String>,
    pub control_library_description: Option<String>,
    pub control_library_type: Option<String>,
    pub control_library_version: Option<String>,
    pub version_group_label: Option<String>,
    pub latest: Option<bool>,
    pub hierarchy_enabled: Option<bool>,
    pub created_on: Option<String>,
    pub created_by: Option<String>,
    pub updated_on: Option<String>,
    pub updated_by: Option<String>,
    pub controls_count: Option<i64>,
    pub control_parents_count: Option<i64>,
    pub controls: Vec<JsonValue>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlLibraryCollection {
    pub limit: Option<i64>,
    pub total_count: Option<i64>,
    pub first: Option<PageRef>,
    pub next: Option<PageRef>,
    pub control_libraries: Vec<ControlLibrary>,
}

impl PagedResponse for ControlLibraryCollection {
    type Item = ControlLibrary;

    fn next_page(&self) -> Option<&PageRef> {
        self.next.as_ref()
    }

    fn into_items(self) -> Vec<ControlLibrary> {
        self.control_libraries
    }
}

/// Body of `CreateScan`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanPrototype {
    pub attachment_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scan {
    pub id: Option<String>,
    pub account_id: Option<String>,
    pub attachment_id: Option<String>,
    pub report_id: Option<String>,
    pub status: Option<String>,
    pub last_scan_time: Option<String>,
    pub next_scan_time: Option<String>,
    pub scan_type: Option<String>,
    pub occurence: Option<i64>,
}
