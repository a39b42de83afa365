//! Command handlers. Each renders to the writer it is given and reports failures as
//! [`CliError`](crate::client::CliError).

pub(crate) mod dashboard;
pub(crate) mod products;

use feedscope_core::ToastCenter;
use reqwest::Url;

use crate::cli::OutputFormat;
use crate::client::ApiClient;

/// Everything a handler needs for one invocation.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) api: ApiClient,
    pub(crate) api_url: Url,
    pub(crate) toasts: ToastCenter,
    pub(crate) output: OutputFormat,
}
