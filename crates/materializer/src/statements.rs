use std::fmt;

/// One view definition read from the source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Zero-based position in the scan.
    pub index: usize,
    pub sql: String,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.index, self.sql)
    }
}

/// Statements in the order the source scan returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementList(Vec<Statement>);

impl StatementList {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Statement> {
        self.0.iter()
    }

    pub fn as_sql(&self) -> Vec<&str> {
        self.0.iter().map(|s| s.sql.as_str()).collect()
    }
}

// Indices always follow insertion order.
impl<S: Into<String>> FromIterator<S> for StatementList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .enumerate()
                .map(|(index, sql)| Statement {
                    index,
                    sql: sql.into(),
                })
                .collect(),
        )
    }
}

impl IntoIterator for StatementList {
    type Item = Statement;
    type IntoIter = std::vec::IntoIter<Statement>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a StatementList {
    type Item = &'a Statement;
    type IntoIter = std::slice::Iter<'a, Statement>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
