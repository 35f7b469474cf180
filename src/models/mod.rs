/// A single page of search results and the outcome of fetching one.
pub mod page;
/// Individual posts and their authors.
pub mod post;
/// The ordered result of a whole search.
pub mod posts;

/// Decodes a page pointer, reading both `null` and `0` as "no such page".
pub(crate) fn de_page<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = <Option<u32> as serde::Deserialize>::deserialize(deserializer)?;
    Ok(value.filter(|&page| page != 0))
}
