/// Clamp a page request into `[start, end)` over `total` items. Returns the
/// next cursor when more items remain.
fn paginate(
    total: usize,
    after: Option<usize>,
    limit: Option<usize>,
) -> Result<(usize, usize, Option<usize>), String> {
    let start = after.unwrap_or(0);
    if start > total {
        return Err(format!("cursor {start} is past the end ({total})"));
    }
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let end = (start + limit).min(total);
    let next_cursor = if end < total { Some(end) } else { None };
    Ok((start, end, next_cursor))
}

fn apply_cors_headers(headers: &mut axum::http::HeaderMap) {
    headers.insert(
        HeaderName::from_static("access-control-allow-origin"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-methods"),
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-headers"),
        HeaderValue::from_static("content-type"),
    );
}
