use datatable::cell::CellValue;
use datatable::column::ColumnDescriptor;
use datatable::loader::{FileRow, LoadedTable};

const USERS: [(i64, &str, &str, &str, &str, &str); 5] = [
    (1, "John Doe", "john@example.com", "Admin", "active", "2024-01-15"),
    (2, "Jane Smith", "jane@example.com", "User", "active", "2024-01-14"),
    (3, "Bob Johnson", "bob@example.com", "Manager", "inactive", "2024-01-10"),
    (4, "Alice Brown", "alice@example.com", "User", "active", "2024-01-13"),
    (5, "Charlie Wilson", "charlie@example.com", "Admin", "active", "2024-01-12"),
];

const TITLES: [&str; 6] = ["ID", "Name", "Email", "Role", "Status", "Last Login"];

/// Built-in user table shown when no file is given.
pub fn users() -> LoadedTable {
    let rows = USERS
        .iter()
        .map(|&(id, name, email, role, status, last_login)| {
            vec![
                Some(CellValue::Int(id)),
                Some(name.into()),
                Some(email.into()),
                Some(role.into()),
                Some(status.into()),
                Some(last_login.into()),
            ]
        })
        .collect();
    LoadedTable {
        name: "users".to_string(),
        column_names: vec![
            "id".into(),
            "name".into(),
            "email".into(),
            "role".into(),
            "status".into(),
            "lastLogin".into(),
        ],
        rows,
    }
}

pub fn user_columns(table: &LoadedTable) -> Vec<ColumnDescriptor<FileRow>> {
    table
        .column_descriptors()
        .into_iter()
        .zip(TITLES)
        .map(|(mut column, title)| {
            column.title = title.to_string();
            column
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn users_have_titled_sortable_columns() {
        let table = users();
        let columns = user_columns(&table);
        assert_eq!(table.rows.len(), 5);
        assert_eq!(columns.len(), 6);
        assert_eq!(columns[5].key, "lastLogin");
        assert_eq!(columns[5].title, "Last Login");
        assert!(columns.iter().all(|c| c.sortable));
        assert_eq!(columns[1].value(&table.rows[2]), Some(CellValue::from("Bob Johnson")));
    }
}
