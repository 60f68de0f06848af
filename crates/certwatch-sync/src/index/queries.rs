//! Read-only views over the index.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use certwatch_core::{
    ArchiveName, CertStatus, CertificateQuery, CertificateRecord, IndexStats, IssuerCount, Page,
    SortField,
};

use super::convert::{row_to_record, RECORD_COLUMNS};
use super::store::IndexStore;
use crate::error::Result;

/// Column for a sort key. Only these strings ever reach `ORDER BY`.
const fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::ArchiveName => "archive_name",
        SortField::SubjectCn => "subject_cn",
        SortField::Issuer => "issuer_cn",
        SortField::NotBefore => "not_before",
        SortField::NotAfter => "not_after",
        SortField::DaysToExpiry => "days_to_expiry",
        SortField::Status => "status",
        SortField::KeyBits => "key_bits",
        SortField::FileSize => "file_size",
        SortField::SyncedAt => "synced_at",
    }
}

/// Wrap `term` for a substring `LIKE ... ESCAPE '\'` match.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// WHERE clause and bound values for a query's filters.
fn filter_clause(query: &CertificateQuery) -> (String, Vec<Value>) {
    let mut clauses = vec!["is_live = 1".to_string()];
    let mut args = Vec::new();

    if let Some(term) = query.search.as_deref().filter(|s| !s.is_empty()) {
        clauses.push(
            "(archive_name LIKE ? ESCAPE '\\' OR subject_cn LIKE ? ESCAPE '\\' \
             OR issuer_cn LIKE ? ESCAPE '\\')"
                .to_string(),
        );
        let pattern = like_pattern(term);
        args.extend(std::iter::repeat(Value::Text(pattern)).take(3));
    }
    if let Some(status) = query.status {
        clauses.push("status = ?".to_string());
        args.push(Value::Text(status.as_str().to_string()));
    }
    if let Some(issuer) = query.issuer.as_deref().filter(|s| !s.is_empty()) {
        clauses.push("issuer_cn LIKE ? ESCAPE '\\'".to_string());
        args.push(Value::Text(like_pattern(issuer)));
    }

    (clauses.join(" AND "), args)
}

fn collect_records(
    conn: &Connection,
    sql: &str,
    args: &[Value],
) -> Result<Vec<CertificateRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(args.iter()), row_to_record)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

impl IndexStore {
    /// One page of live records matching `query`.
    ///
    /// Ties on the sort key are broken by archive name then entry path, so
    /// paging is stable.
    pub fn list(&self, query: &CertificateQuery) -> Result<Page<CertificateRecord>> {
        query.validate()?;
        let (where_sql, mut args) = filter_clause(query);
        let conn = self.conn()?;

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM certificates WHERE {where_sql}"),
            params_from_iter(args.iter()),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM certificates WHERE {where_sql} \
             ORDER BY {col} {dir}, archive_name ASC, entry_path ASC LIMIT ? OFFSET ?",
            col = sort_column(query.sort),
            dir = query.order.as_sql(),
        );
        args.push(Value::Integer(i64::from(query.size)));
        args.push(Value::Integer(
            i64::try_from(query.offset()).unwrap_or(i64::MAX),
        ));

        let items = collect_records(&conn, &sql, &args)?;
        Ok(Page::new(
            items,
            query.page,
            query.size,
            u64::try_from(total).unwrap_or_default(),
        ))
    }

    /// All live records of one archive, ordered by entry path.
    pub fn archive(&self, name: &ArchiveName) -> Result<Vec<CertificateRecord>> {
        let conn = self.conn()?;
        collect_records(
            &conn,
            &format!(
                "SELECT {RECORD_COLUMNS} FROM certificates \
                 WHERE archive_name = ? AND is_live = 1 ORDER BY entry_path"
            ),
            &[Value::Text(name.to_string())],
        )
    }

    /// Every live record, optionally restricted to one status.
    pub fn export(&self, status: Option<CertStatus>) -> Result<Vec<CertificateRecord>> {
        let conn = self.conn()?;
        let (filter, args) = status.map_or_else(
            || (String::new(), Vec::new()),
            |s| (" AND status = ?".to_string(), vec![Value::Text(s.as_str().to_string())]),
        );
        collect_records(
            &conn,
            &format!(
                "SELECT {RECORD_COLUMNS} FROM certificates WHERE is_live = 1{filter} \
                 ORDER BY archive_name, entry_path"
            ),
            &args,
        )
    }

    /// Names of all archives that currently have records.
    pub fn archive_names(&self) -> Result<Vec<ArchiveName>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT DISTINCT archive_name FROM certificates ORDER BY archive_name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names
            .into_iter()
            .filter_map(|n| ArchiveName::parse(n).ok())
            .collect())
    }

    /// Totals by status and by issuer.
    pub fn stats(&self) -> Result<IndexStats> {
        let conn = self.conn()?;
        let mut stats = IndexStats::default();

        let mut by_status = conn.prepare(
            "SELECT status, COUNT(*) FROM certificates WHERE is_live = 1 GROUP BY status",
        )?;
        let rows = by_status.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (status, count) = row?;
            let count = u64::try_from(count).unwrap_or_default();
            match status.parse::<CertStatus>() {
                Ok(CertStatus::Valid) => stats.valid = count,
                Ok(CertStatus::ExpiringSoon) => stats.expiring_soon = count,
                Ok(CertStatus::Expired) => stats.expired = count,
                Err(_) => continue,
            }
            stats.total += count;
        }

        let mut by_issuer = conn.prepare(
            "SELECT issuer_cn, COUNT(*) AS n FROM certificates WHERE is_live = 1 \
             GROUP BY issuer_cn ORDER BY n DESC, issuer_cn ASC",
        )?;
        stats.issuers = by_issuer
            .query_map([], |row| {
                Ok(IssuerCount {
                    name: row.get(0)?,
                    count: u64::try_from(row.get::<_, i64>(1)?).unwrap_or_default(),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(stats)
    }
}
