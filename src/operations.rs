//! Operation table of the compliance API and typed wrappers over it.

use crate::{
    pagination::{LIMIT_PARAM, START_PARAM},
    Attachment, AttachmentCollection, AttachmentPrototype, AttachmentsPrototype, CallContext,
    ComplianceClient, ControlLibrary, ControlLibraryCollection, HttpMethod, OperationDescriptor,
    OperationParams, PageOptions, Pager, Profile, ProfileCollection, ProfilePrototype,
    RequestBody, Response, ResponseShape, Result, Scan, ScanPrototype,
};

const PAGE_PARAMS: &[&str] = &[LIMIT_PARAM, START_PARAM];
const PROFILE_BODY: &[&str] = &[
    "profile_name",
    "profile_description",
    "profile_version",
    "controls",
    "default_parameters",
];

pub const CREATE_PROFILE: OperationDescriptor = OperationDescriptor::new(
    "CreateProfile",
    HttpMethod::Post,
    "/instances/{instance_id}/v3/profiles",
)
.path_params(&["instance_id"])
.body_required(PROFILE_BODY);

pub const LIST_PROFILES: OperationDescriptor = OperationDescriptor::new(
    "ListProfiles",
    HttpMethod::Get,
    "/instances/{instance_id}/v3/profiles",
)
.path_params(&["instance_id"])
.query_params(PAGE_PARAMS);

pub const GET_PROFILE: OperationDescriptor = OperationDescriptor::new(
    "GetProfile",
    HttpMethod::Get,
    "/instances/{instance_id}/v3/profiles/{profile_id}",
)
.path_params(&["instance_id", "profile_id"]);

pub const REPLACE_PROFILE: OperationDescriptor = OperationDescriptor::new(
    "ReplaceProfile",
    HttpMethod::Put,
    "/instances/{instance_id}/v3/profiles/{profile_id}",
)
.path_params(&["instance_id", "profile_id"])
.body_required(PROFILE_BODY);

pub const DELETE_CUSTOM_PROFILE: OperationDescriptor = OperationDescriptor::new(
    "DeleteCustomProfile",
    HttpMethod::Delete,
    "/instances/{instance_id}/v3/profiles/{profile_id}",
)
.path_params(&["instance_id", "profile_id"]);

pub const CREATE_ATTACHMENT: OperationDescriptor = OperationDescriptor::new(
    "CreateAttachment",
    HttpMethod::Post,
    "/instances/{instance_id}/v3/profiles/{profile_id}/attachments",
)
.path_params(&["instance_id", "profile_id"])
.body_required(&["attachments"]);

pub const LIST_ATTACHMENTS: OperationDescriptor = OperationDescriptor::new(
    "ListAttachments",
    HttpMethod::Get,
    "/instances/{instance_id}/v3/profiles/{profile_id}/attachments",
)
.path_params(&["instance_id", "profile_id"])
.query_params(PAGE_PARAMS);

pub const GET_PROFILE_ATTACHMENT: OperationDescriptor = OperationDescriptor::new(
    "GetProfileAttachment",
    HttpMethod::Get,
    "/instances/{instance_id}/v3/profiles/{profile_id}/attachments/{attachment_id}",
)
.path_params(&["instance_id", "profile_id", "attachment_id"]);

pub const REPLACE_PROFILE_ATTACHMENT: OperationDescriptor = OperationDescriptor::new(
    "ReplaceProfileAttachment",
    HttpMethod::Put,
    "/instances/{instance_id}/v3/profiles/{profile_id}/attachments/{attachment_id}",
)
.path_params(&["instance_id", "profile_id", "attachment_id"])
.body_required(&["name", "scope", "status", "schedule", "attachment_parameters"]);

pub const DELETE_PROFILE_ATTACHMENT: OperationDescriptor = OperationDescriptor::new(
    "DeleteProfileAttachment",
    HttpMethod::Delete,
    "/instances/{instance_id}/v3/profiles/{profile_id}/attachments/{attachment_id}",
)
.path_params(&["instance_id", "profile_id", "attachment_id"]);

pub const LIST_CONTROL_LIBRARIES: OperationDescriptor = OperationDescriptor::new(
    "ListControlLibraries",
    HttpMethod::Get,
    "/instances/{instance_id}/v3/control_libraries",
)
.path_params(&["instance_id"])
.query_params(&[LIMIT_PARAM, START_PARAM, "control_library_type"]);

pub const GET_CONTROL_LIBRARY: OperationDescriptor = OperationDescriptor::new(
    "GetControlLibrary",
    HttpMethod::Get,
    "/instances/{instance_id}/v3/control_libraries/{control_library_id}",
)
.path_params(&["instance_id", "control_library_id"]);

pub const CREATE_SCAN: OperationDescriptor = OperationDescriptor::new(
    "CreateScan",
    HttpMethod::Post,
    "/instances/{instance_id}/v3/scans",
)
.path_params(&["instance_id"])
.body_required(&["attachment_id"]);

pub const GET_REPORTS_CSV: OperationDescriptor = OperationDescriptor::new(
    "GetReportsCsv",
    HttpMethod::Get,
    "/instances/{instance_id}/v3/reports/{report_id}/download",
)
.path_params(&["instance_id", "report_id"])
.query_params(&["exclude_summary"])
.response(ResponseShape::Binary("text/csv"));

/// Every operation this crate knows about.
pub const ALL: &[&OperationDescriptor] = &[
    &CREATE_PROFILE,
    &LIST_PROFILES,
    &GET_PROFILE,
    &REPLACE_PROFILE,
    &DELETE_CUSTOM_PROFILE,
    &CREATE_ATTACHMENT,
    &LIST_ATTACHMENTS,
    &GET_PROFILE_ATTACHMENT,
    &REPLACE_PROFILE_ATTACHMENT,
    &DELETE_PROFILE_ATTACHMENT,
    &LIST_CONTROL_LIBRARIES,
    &GET_CONTROL_LIBRARY,
    &CREATE_SCAN,
    &GET_REPORTS_CSV,
];

fn instance(instance_id: &str) -> OperationParams {
    OperationParams::new().path("instance_id", instance_id)
}

fn profile(instance_id: &str, profile_id: &str) -> OperationParams {
    instance(instance_id).path("profile_id", profile_id)
}

fn attachment(instance_id: &str, profile_id: &str, attachment_id: &str) -> OperationParams {
    profile(instance_id, profile_id).path("attachment_id", attachment_id)
}

impl ComplianceClient {
    pub async fn create_profile(
        &self,
        instance_id: &str,
        body: &ProfilePrototype,
        ctx: &CallContext,
    ) -> Result<Response<Profile>> {
        let body = RequestBody::json(body)?;
        self.invoke(&CREATE_PROFILE, &instance(instance_id), body, ctx)
            .await
    }

    pub async fn list_profiles(
        &self,
        instance_id: &str,
        page: &PageOptions,
        ctx: &CallContext,
    ) -> Result<Response<ProfileCollection>> {
        let params = page.apply(instance(instance_id));
        self.invoke(&LIST_PROFILES, &params, RequestBody::Empty, ctx)
            .await
    }

    pub fn profiles_pager(
        &self,
        instance_id: &str,
        limit: Option<u32>,
        ctx: CallContext,
    ) -> Result<Pager<'_, ProfileCollection>> {
        let page = PageOptions { limit, start: None };
        Pager::new(self, &LIST_PROFILES, page.apply(instance(instance_id)), ctx)
    }

    pub async fn get_profile(
        &self,
        instance_id: &str,
        profile_id: &str,
        ctx: &CallContext,
    ) -> Result<Response<Profile>> {
        self.invoke(
            &GET_PROFILE,
            &profile(instance_id, profile_id),
            RequestBody::Empty,
            ctx,
        )
        .await
    }

    pub async fn replace_profile(
        &self,
        instance_id: &str,
        profile_id: &str,
        body: &ProfilePrototype,
        ctx: &CallContext,
    ) -> Result<Response<Profile>> {
        let body = RequestBody::json(body)?;
        self.invoke(&REPLACE_PROFILE, &profile(instance_id, profile_id), body, ctx)
            .await
    }

    pub async fn delete_custom_profile(
        &self,
        instance_id: &str,
        profile_id: &str,
        ctx: &CallContext,
    ) -> Result<Response<Profile>> {
        self.invoke(
            &DELETE_CUSTOM_PROFILE,
            &profile(instance_id, profile_id),
            RequestBody::Empty,
            ctx,
        )
        .await
    }

    pub async fn create_attachment(
        &self,
        instance_id: &str,
        profile_id: &str,
        body: &AttachmentPrototype,
        ctx: &CallContext,
    ) -> Result<Response<AttachmentPrototype>> {
        let body = RequestBody::json(body)?;
        self.invoke(&CREATE_ATTACHMENT, &profile(instance_id, profile_id), body, ctx)
            .await
    }

    pub async fn list_attachments(
        &self,
        instance_id: &str,
        profile_id: &str,
        page: &PageOptions,
        ctx: &CallContext,
    ) -> Result<Response<AttachmentCollection>> {
        let params = page.apply(profile(instance_id, profile_id));
        self.invoke(&LIST_ATTACHMENTS, &params, RequestBody::Empty, ctx)
            .await
    }

    pub fn attachments_pager(
        &self,
        instance_id: &str,
        profile_id: &str,
        limit: Option<u32>,
        ctx: CallContext,
    ) -> Result<Pager<'_, AttachmentCollection>> {
        let page = PageOptions { limit, start: None };
        Pager::new(
            self,
            &LIST_ATTACHMENTS,
            page.apply(profile(instance_id, profile_id)),
            ctx,
        )
    }

    pub async fn get_profile_attachment(
        &self,
        instance_id: &str,
        profile_id: &str,
        attachment_id: &str,
        ctx: &CallContext,
    ) -> Result<Response<Attachment>> {
        self.invoke(
            &GET_PROFILE_ATTACHMENT,
            &attachment(instance_id, profile_id, attachment_id),
            RequestBody::Empty,
            ctx,
        )
        .await
    }

    pub async fn replace_profile_attachment(
        &self,
        instance_id: &str,
        profile_id: &str,
        attachment_id: &str,
        body: &AttachmentsPrototype,
        ctx: &CallContext,
    ) -> Result<Response<Attachment>> {
        let body = RequestBody::json(body)?;
        self.invoke(
            &REPLACE_PROFILE_ATTACHMENT,
            &attachment(instance_id, profile_id, attachment_id),
            body,
            ctx,
        )
        .await
    }

    pub async fn delete_profile_attachment(
        &self,
        instance_id: &str,
        profile_id: &str,
        attachment_id: &str,
        ctx: &CallContext,
    ) -> Result<Response<Attachment>> {
        self.invoke(
            &DELETE_PROFILE_ATTACHMENT,
            &attachment(instance_id, profile_id, attachment_id),
            RequestBody::Empty,
            ctx,
        )
        .await
    }

    pub async fn list_control_libraries(
        &self,
        instance_id: &str,
        control_library_type: Option<&str>,
        page: &PageOptions,
        ctx: &CallContext,
    ) -> Result<Response<ControlLibraryCollection>> {
        let params = page
            .apply(instance(instance_id))
            .query_opt("control_library_type", control_library_type);
        self.invoke(&LIST_CONTROL_LIBRARIES, &params, RequestBody::Empty, ctx)
            .await
    }

    pub fn control_libraries_pager(
        &self,
        instance_id: &str,
        limit: Option<u32>,
        ctx: CallContext,
    ) -> Result<Pager<'_, ControlLibraryCollection>> {
        let page = PageOptions { limit, start: None };
        Pager::new(
            self,
            &LIST_CONTROL_LIBRARIES,
            page.apply(instance(instance_id)),
            ctx,
        )
    }

    pub async fn get_control_library(
        &self,
        instance_id: &str,
        control_library_id: &str,
        ctx: &CallContext,
    ) -> Result<Response<ControlLibrary>> {
        let params = instance(instance_id).path("control_library_id", control_library_id);
        self.invoke(&GET_CONTROL_LIBRARY, &params, RequestBody::Empty, ctx)
            .await
    }

    pub async fn create_scan(
        &self,
        instance_id: &str,
        body: &ScanPrototype,
        ctx: &CallContext,
    ) -> Result<Response<Scan>> {
        let body = RequestBody::json(body)?;
        self.invoke(&CREATE_SCAN, &instance(instance_id), body, ctx)
            .await
    }

    /// Downloads a report as CSV bytes.
    pub async fn get_reports_csv(
        &self,
        instance_id: &str,
        report_id: &str,
        exclude_summary: Option<bool>,
        ctx: &CallContext,
    ) -> Result<Response<Vec<u8>>> {
        let params = instance(instance_id)
            .path("report_id", report_id)
            .query_opt("exclude_summary", exclude_summary.map(|flag| flag.to_string()));
        self.invoke_binary(&GET_REPORTS_CSV, &params, RequestBody::Empty, ctx)
            .await
    }
}
