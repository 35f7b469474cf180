use crate::config::DateRange;

/// A search for one member's posts created inside a date range.
///
/// The service reads `+` in the `q` parameter as the separator between
/// search terms, while `%2B` is a literal plus sign. The query is therefore
/// assembled by hand: every term is percent-encoded (`:` as `%3A`, `>` as
/// `%3E`, `<` as `%3C`) and the terms are joined with a bare `+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    username: String,
    range: DateRange,
}

impl SearchQuery {
    /// Constructs a query for `username` over `range`.
    pub fn new(username: impl Into<String>, range: DateRange) -> Self {
        Self {
            username: username.into(),
            range,
        }
    }

    /// Member whose posts are searched.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Creation dates searched.
    pub fn range(&self) -> DateRange {
        self.range
    }

    /// The encoded value of the `q` parameter.
    pub fn terms(&self) -> String {
        let user = format!("user:{}", self.username);
        let from = format!("created:>{}", self.range.from().format("%Y-%m-%d"));
        let to = format!("created:<{}", self.range.to().format("%Y-%m-%d"));

        [user, from, to]
            .iter()
            .map(|term| urlencoding::encode(term))
            .collect::<Vec<_>>()
            .join("+")
    }

    /// The full query string for `page`, without the leading `?`.
    ///
    /// Page 1 is the service default, so pages `<= 1` carry no `page` parameter.
    pub fn encode(&self, page: u32) -> String {
        if page > 1 {
            format!("q={}&page={page}", self.terms())
        } else {
            format!("q={}", self.terms())
        }
    }
}
