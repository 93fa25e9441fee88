use std::fmt::Display;

/// PostgREST query-string builder (`column=op.value` pairs)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestQuery {
    params: Vec<(String, String)>,
}

impl RestQuery {
    pub fn select(columns: &str) -> Self {
        Self::default().param("select", columns)
    }

    /// Predicates without a `select` (updates and deletes)
    pub fn filter() -> Self {
        Self::default()
    }

    pub fn eq(self, column: &str, value: impl Display) -> Self {
        self.param(column, format!("eq.{value}"))
    }

    /// Case-insensitive substring match
    pub fn ilike_contains(self, column: &str, needle: &str) -> Self {
        self.param(column, format!("ilike.*{needle}*"))
    }

    pub fn order_desc(self, column: &str) -> Self {
        self.param("order", format!("{column}.desc"))
    }

    pub fn limit(self, limit: usize) -> Self {
        self.param("limit", limit.to_string())
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.push((key.to_string(), value.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(query: &RestQuery) -> Vec<(&str, &str)> {
        query
            .params()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    #[test]
    fn test_builds_postgrest_operators() {
        let query = RestQuery::select("*")
            .eq("status", "active")
            .ilike_contains("location", "york")
            .eq("is_remote", true)
            .order_desc("created_at")
            .limit(1);

        assert_eq!(
            pairs(&query),
            vec![
                ("select", "*"),
                ("status", "eq.active"),
                ("location", "ilike.*york*"),
                ("is_remote", "eq.true"),
                ("order", "created_at.desc"),
                ("limit", "1"),
            ]
        );
    }

    #[test]
    fn test_filter_has_no_select() {
        let query = RestQuery::filter().eq("id", "abc");
        assert_eq!(pairs(&query), vec![("id", "eq.abc")]);
    }
}
