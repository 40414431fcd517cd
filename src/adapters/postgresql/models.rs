//! Conversions between driver rows/values and domain types

use crate::core::report::SqlParam;
use crate::domain::{
    AccountId, AccountRecord, Cell, LoginRecord, SourceError, SourceRow, TermId, TermRecord,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use tokio_postgres::types::{FromSql, ToSql, Type};
use tokio_postgres::Row;

/// Owned query parameter handed to the driver
pub type BoxedParam = Box<dyn ToSql + Sync + Send>;

pub fn to_boxed_params(params: &[SqlParam]) -> Vec<BoxedParam> {
    params
        .iter()
        .map(|p| -> BoxedParam {
            match p {
                SqlParam::Int(v) => Box::new(*v),
                SqlParam::Text(v) => Box::new(v.clone()),
                SqlParam::Time(v) => Box::new(*v),
            }
        })
        .collect()
}

pub fn param_refs(params: &[BoxedParam]) -> Vec<&(dyn ToSql + Sync)> {
    params
        .iter()
        .map(|p| p.as_ref() as &(dyn ToSql + Sync))
        .collect()
}

fn get<'a, T: FromSql<'a>>(row: &'a Row, idx: usize) -> Result<T, SourceError> {
    row.try_get(idx).map_err(|e| SourceError::UnexpectedType {
        column: row.columns()[idx].name().to_string(),
        found: e.to_string(),
    })
}

fn named<'a, T: FromSql<'a>>(row: &'a Row, column: &str) -> Result<T, SourceError> {
    row.try_get(column).map_err(|e| {
        if row.columns().iter().any(|c| c.name() == column) {
            SourceError::UnexpectedType {
                column: column.to_string(),
                found: e.to_string(),
            }
        } else {
            SourceError::MissingColumn(column.to_string())
        }
    })
}

/// Convert one column of a driver row into a cell, by its SQL type
pub fn cell_at(row: &Row, idx: usize) -> Result<Cell, SourceError> {
    let ty = row.columns()[idx].type_();
    let cell = if *ty == Type::INT8 {
        get::<Option<i64>>(row, idx)?.into()
    } else if *ty == Type::INT4 {
        get::<Option<i32>>(row, idx)?.map(i64::from).into()
    } else if *ty == Type::INT2 {
        get::<Option<i16>>(row, idx)?.map(i64::from).into()
    } else if *ty == Type::BOOL {
        get::<Option<bool>>(row, idx)?.into()
    } else if [Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME].contains(ty) {
        get::<Option<String>>(row, idx)?.into()
    } else if *ty == Type::TIMESTAMPTZ {
        get::<Option<DateTime<Utc>>>(row, idx)?.into()
    } else if *ty == Type::TIMESTAMP {
        get::<Option<NaiveDateTime>>(row, idx)?
            .map(|t| t.and_utc())
            .into()
    } else {
        return Err(SourceError::UnexpectedType {
            column: row.columns()[idx].name().to_string(),
            found: ty.name().to_string(),
        });
    };
    Ok(cell)
}

/// Convert a whole driver row, keyed by column alias
pub fn source_row(row: &Row) -> Result<SourceRow, SourceError> {
    let mut out = SourceRow::new();
    for (idx, column) in row.columns().iter().enumerate() {
        out.insert(column.name(), cell_at(row, idx)?);
    }
    Ok(out)
}

fn account_id(value: i64, column: &str) -> Result<AccountId, SourceError> {
    AccountId::new(value).map_err(|found| SourceError::UnexpectedType {
        column: column.to_string(),
        found,
    })
}

fn opt_account_id(value: Option<i64>, column: &str) -> Result<Option<AccountId>, SourceError> {
    value.map(|v| account_id(v, column)).transpose()
}

/// `id, root_account_id, parent_account_id, name, domain`
pub fn account_record(row: &Row) -> Result<AccountRecord, SourceError> {
    Ok(AccountRecord {
        id: account_id(named(row, "id")?, "id")?,
        root_account_id: opt_account_id(named(row, "root_account_id")?, "root_account_id")?,
        parent_account_id: opt_account_id(named(row, "parent_account_id")?, "parent_account_id")?,
        name: named::<Option<String>>(row, "name")?.unwrap_or_default(),
        domain: named(row, "domain")?,
    })
}

/// `id, root_account_id, name`
pub fn term_record(row: &Row) -> Result<TermRecord, SourceError> {
    let id: i64 = named(row, "id")?;
    Ok(TermRecord {
        id: TermId::new(id).map_err(|found| SourceError::UnexpectedType {
            column: "id".to_string(),
            found,
        })?,
        root_account_id: account_id(named(row, "root_account_id")?, "root_account_id")?,
        name: named::<Option<String>>(row, "name")?.unwrap_or_default(),
    })
}

/// `id, user_id, account_id, unique_id, sis_user_id, position, domain`
pub fn login_record(row: &Row) -> Result<LoginRecord, SourceError> {
    Ok(LoginRecord {
        id: named(row, "id")?,
        user_id: named(row, "user_id")?,
        account_id: account_id(named(row, "account_id")?, "account_id")?,
        unique_id: named(row, "unique_id")?,
        sis_user_id: named(row, "sis_user_id")?,
        position: named(row, "position")?,
        account_domain: named(row, "domain")?,
    })
}
