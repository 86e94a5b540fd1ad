use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{
    CallContext, ComplianceClient, ComplianceError, OperationDescriptor, OperationParams,
    RequestBody, Result,
};

/// Query parameter carrying the continuation token.
pub const START_PARAM: &str = "start";
pub const LIMIT_PARAM: &str = "limit";

/// Page link returned in the `first` and `next` fields of list responses.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
}

impl PageRef {
    /// Continuation token: `start` when present, otherwise the `start` query
    /// parameter of `href`.
    pub fn start_token(&self) -> Option<String> {
        if let Some(start) = self.start.as_deref().filter(|start| !start.is_empty()) {
            return Some(start.to_owned());
        }
        let href = self.href.as_deref()?;
        let (_, query) = href.split_once('?')?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(name, _)| name == START_PARAM)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    }
}

/// List response that may point at a further page.
pub trait PagedResponse: DeserializeOwned {
    type Item;

    fn next_page(&self) -> Option<&PageRef>;

    fn into_items(self) -> Vec<Self::Item>;

    /// `None` marks the terminal page.
    fn next_start(&self) -> Option<String> {
        self.next_page().and_then(PageRef::start_token)
    }
}

/// Optional paging parameters for list operations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageOptions {
    pub limit: Option<u32>,
    pub start: Option<String>,
}

impl PageOptions {
    pub(crate) fn apply(&self, params: OperationParams) -> OperationParams {
        params
            .query_opt(LIMIT_PARAM, self.limit.map(|limit| limit.to_string()))
            .query_opt(START_PARAM, self.start.clone())
    }
}

/// Parameters for the page after `response`, or `None` on the terminal page.
///
/// A `next` token equal to the one just requested is treated as terminal.
/// Every other parameter is carried over unchanged.
pub fn next_page_params<P: PagedResponse>(
    params: &OperationParams,
    response: &P,
) -> Option<OperationParams> {
    let start = response.next_start()?;
    if params.query_value(START_PARAM) == Some(start.as_str()) {
        return None;
    }
    let mut next = params.clone();
    next.set_query(START_PARAM, start);
    Some(next)
}

/// Walks a list operation page by page.
#[derive(Debug)]
pub struct Pager<'a, P> {
    client: &'a ComplianceClient,
    op: &'static OperationDescriptor,
    params: OperationParams,
    ctx: CallContext,
    has_next: bool,
    _page: PhantomData<fn() -> P>,
}

impl<'a, P: PagedResponse> Pager<'a, P> {
    /// Fails when `op` does not accept a `start` query parameter.
    pub fn new(
        client: &'a ComplianceClient,
        op: &'static OperationDescriptor,
        params: OperationParams,
        ctx: CallContext,
    ) -> Result<Self> {
        if !op.accepts_query(START_PARAM) {
            return Err(ComplianceError::Validation(format!(
                "{} does not support pagination",
                op.name
            )));
        }
        Ok(Self {
            client,
            op,
            params,
            ctx,
            has_next: true,
            _page: PhantomData,
        })
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    /// Fetches the next page. A failed call leaves the cursor where it was.
    pub async fn next_page(&mut self) -> Result<Vec<P::Item>> {
        if !self.has_next {
            return Err(ComplianceError::Validation(format!(
                "{}: no more pages",
                self.op.name
            )));
        }

        let response = self
            .client
            .invoke::<P>(self.op, &self.params, RequestBody::Empty, &self.ctx)
            .await?;
        let Some(page) = response.result else {
            self.has_next = false;
            return Ok(Vec::new());
        };

        match next_page_params(&self.params, &page) {
            Some(next) => self.params = next,
            None => self.has_next = false,
        }
        Ok(page.into_items())
    }

    /// Fetches every remaining page.
    pub async fn collect_all(mut self) -> Result<Vec<P::Item>> {
        let mut items = Vec::new();
        while self.has_next {
            items.extend(self.next_page().await?);
        }
        Ok(items)
    }
}
