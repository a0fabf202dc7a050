/// Returns the cached value for `$key`, or evaluates `$block`, stores the
/// result with `$ttl` seconds to live and returns it.
///
/// A failing cache read is logged and treated as a miss, so an unreachable
/// Redis never fails the request.
///
/// ```rust,ignore
/// let page: TmdbDiscoverPage = cached!(cache, CacheKey::DiscoverPage(1), 3600, async move {
///     fetch_page(1).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        let hit = match $cache.get_from_cache(&key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Cache read failed, treating as miss");
                None
            }
        };
        match hit {
            Some(cached) => Ok(cached),
            None => match $block.await {
                Ok(value) => {
                    $cache.set_in_background(&key, &value, $ttl);
                    Ok(value)
                }
                Err(e) => Err(e),
            },
        }
    }};
}
