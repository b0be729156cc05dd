pub mod finetune;
pub mod llm;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Turns a non-2xx provider response into an error carrying the body text.
pub(crate) async fn ensure_success(
    resp: reqwest::Response,
    what: &str,
) -> anyhow::Result<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let error_text = resp.text().await.unwrap_or_default();
    anyhow::bail!("OpenAI {} API error ({}): {}", what, status, error_text);
}

pub(crate) fn trim_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}
