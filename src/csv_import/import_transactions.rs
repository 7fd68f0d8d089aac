use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Multipart, State, multipart::Field},
    http::StatusCode,
    response::Response,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::AccountId,
    auth::UserID,
    csv_import::csv::{ColumnMapping, parse_csv},
    response::render_data,
    transaction::insert_transactions,
};

/// The state needed for importing transactions.
#[derive(Debug, Clone)]
pub struct ImportState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ImportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The fields collected from the multipart form.
#[derive(Default)]
struct ImportForm {
    account_id: Option<AccountId>,
    csv_data: Option<String>,
    mapping: ColumnMapping,
}

/// Route handler for importing transactions from a CSV file.
///
/// Expects a multipart form with the fields:
/// - `account_id`: the account to add the transactions to,
/// - `file`: a CSV file with a header row,
/// - `amount_column`, `date_column`, `payee_column` and `notes_column`:
///   optional header names that override the defaults.
///
/// Either every row is imported or, if any row is invalid, none are.
/// Responds with 201 and the imported transactions.
pub async fn import_transactions(
    State(state): State<ImportState>,
    Extension(user_id): Extension<UserID>,
    mut multipart: Multipart,
) -> Result<Response, Error> {
    let start_time = std::time::Instant::now();
    let mut form = ImportForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| Error::MultipartError(error.body_text()))?
    {
        let field_name = field.name().unwrap_or_default().to_owned();

        match field_name.as_str() {
            "account_id" => {
                let text = read_text_field(field).await?;
                let account_id = text.trim().parse().map_err(|_| {
                    Error::MultipartError(format!("'{text}' is not a valid account ID"))
                })?;
                form.account_id = Some(account_id);
            }
            "file" => form.csv_data = Some(parse_multipart_file(field).await?),
            "amount_column" => form.mapping.amount = read_text_field(field).await?,
            "date_column" => form.mapping.date = read_text_field(field).await?,
            "payee_column" => form.mapping.payee = read_text_field(field).await?,
            "notes_column" => form.mapping.notes = read_text_field(field).await?,
            other => tracing::debug!("Ignoring unexpected multipart field '{other}'"),
        }
    }

    let account_id = form
        .account_id
        .ok_or_else(|| Error::MultipartError("missing field 'account_id'".to_owned()))?;
    let csv_data = form
        .csv_data
        .ok_or_else(|| Error::MultipartError("missing field 'file'".to_owned()))?;

    let builders = parse_csv(&csv_data, &form.mapping, account_id)
        .inspect_err(|error| tracing::debug!("Failed to parse CSV: {error}"))?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let imported_transactions = insert_transactions(builders, user_id, &connection)?;

    tracing::info!(
        "Imported {} transactions into account {account_id} in {}ms",
        imported_transactions.len(),
        start_time.elapsed().as_millis()
    );

    Ok(render_data(StatusCode::CREATED, imported_transactions))
}

async fn read_text_field(field: Field<'_>) -> Result<String, Error> {
    field.text().await.map_err(|error| {
        tracing::error!("Could not read data from multipart form field: {error}");
        Error::MultipartError(error.body_text())
    })
}

async fn parse_multipart_file(field: Field<'_>) -> Result<String, Error> {
    if field.content_type() != Some("text/csv") {
        return Err(Error::NotCSV);
    }

    let file_name = field.file_name().unwrap_or("<unnamed>").to_owned();
    let data = read_text_field(field).await?;

    tracing::debug!("Received file '{}' that is {} bytes", file_name, data.len());

    Ok(data)
}

#[cfg(test)]
mod import_transactions_tests {
    use axum::{
        Extension,
        extract::{FromRequest, Multipart, State},
        http::{Request, StatusCode},
    };
    use serde_json::Value;

    use crate::{
        Error,
        account::create_account,
        auth::UserID,
        csv_import::import_transactions::{ImportState, import_transactions},
        endpoints,
        name::Name,
        test_utils::{create_test_user, get_test_state, response_json},
        transaction::count_transactions,
    };

    const TEST_CSV: &str = "date,payee,amount,notes\n\
        2025-01-15,Buckstars Coffee Shop,-5.50,\n\
        2025-01-15 09:30:00,Supermarket Groceries,-45.20,weekly shop\n\
        2025-01-16,Employer,2000.00,salary\n";

    struct Part<'a> {
        name: &'a str,
        content_type: Option<&'a str>,
        body: &'a str,
    }

    fn text_part<'a>(name: &'a str, body: &'a str) -> Part<'a> {
        Part {
            name,
            content_type: None,
            body,
        }
    }

    fn file_part<'a>(content_type: &'a str, body: &'a str) -> Part<'a> {
        Part {
            name: "file",
            content_type: Some(content_type),
            body,
        }
    }

    async fn must_make_multipart(parts: &[Part<'_>]) -> Multipart {
        let boundary = "MY_BOUNDARY123456789";
        let mut lines: Vec<String> = Vec::new();

        for part in parts {
            lines.push(format!("--{boundary}"));
            match part.content_type {
                Some(content_type) => {
                    lines.push(format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"upload.csv\"",
                        part.name
                    ));
                    lines.push(format!("Content-Type: {content_type}"));
                }
                None => lines.push(format!(
                    "Content-Disposition: form-data; name=\"{}\"",
                    part.name
                )),
            }
            lines.push(String::new());
            lines.push(part.body.to_owned());
        }

        lines.push(format!("--{boundary}--"));

        let data = lines.join("\r\n").into_bytes();

        let request = Request::builder()
            .method("POST")
            .uri(endpoints::TRANSACTIONS_IMPORT)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(data.into())
            .unwrap();

        Multipart::from_request(request, &{}).await.unwrap()
    }

    fn setup() -> (ImportState, UserID, i64) {
        let state = get_test_state();
        let user_id = create_test_user(&state, "test@test.com");
        let account_id = {
            let connection = state.db_connection.lock().unwrap();
            create_account(Name::new_unchecked("Everyday"), user_id, &connection)
                .unwrap()
                .id
        };

        (
            ImportState {
                db_connection: state.db_connection.clone(),
            },
            user_id,
            account_id,
        )
    }

    fn transaction_count(state: &ImportState) -> u32 {
        let connection = state.db_connection.lock().unwrap();
        count_transactions(&connection).unwrap()
    }

    #[tokio::test]
    async fn importing_n_rows_inserts_n_transactions_for_the_account() {
        let (state, user_id, account_id) = setup();
        let account_id_text = account_id.to_string();
        let multipart = must_make_multipart(&[
            text_part("account_id", &account_id_text),
            file_part("text/csv", TEST_CSV),
        ])
        .await;

        let response = import_transactions(State(state.clone()), Extension(user_id), multipart)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response_json(response).await;
        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert!(
            rows.iter()
                .all(|row| row["account_id"] == Value::from(account_id))
        );
        assert_eq!(rows[1]["date"], "2025-01-15");
        assert_eq!(rows[1]["notes"], "weekly shop");
        assert_eq!(rows[0]["notes"], Value::Null);
        assert_eq!(transaction_count(&state), 3);
    }

    #[tokio::test]
    async fn custom_column_names() {
        let (state, user_id, account_id) = setup();
        let account_id_text = account_id.to_string();
        let multipart = must_make_multipart(&[
            text_part("account_id", &account_id_text),
            text_part("amount_column", "Value"),
            text_part("date_column", "Posted"),
            text_part("payee_column", "Description"),
            file_part(
                "text/csv",
                "Posted,Description,Value\n2025-02-01,Rent,-600\n",
            ),
        ])
        .await;

        let response = import_transactions(State(state.clone()), Extension(user_id), multipart)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(transaction_count(&state), 1);
    }

    #[tokio::test]
    async fn invalid_row_imports_nothing() {
        let (state, user_id, account_id) = setup();
        let account_id_text = account_id.to_string();
        let multipart = must_make_multipart(&[
            text_part("account_id", &account_id_text),
            file_part(
                "text/csv",
                "date,payee,amount\n2025-01-15,Cafe,-5.50\nyesterday,Cafe,-4.00\n",
            ),
        ])
        .await;

        let result =
            import_transactions(State(state.clone()), Extension(user_id), multipart).await;

        assert!(matches!(result, Err(Error::InvalidCSV(_))));
        assert_eq!(transaction_count(&state), 0);
    }

    #[tokio::test]
    async fn rejects_non_csv_file() {
        let (state, user_id, account_id) = setup();
        let account_id_text = account_id.to_string();
        let multipart = must_make_multipart(&[
            text_part("account_id", &account_id_text),
            file_part("application/pdf", "%PDF"),
        ])
        .await;

        let result = import_transactions(State(state), Extension(user_id), multipart).await;

        assert_eq!(result.err(), Some(Error::NotCSV));
    }

    #[tokio::test]
    async fn rejects_other_users_account() {
        let (state, _, account_id) = setup();
        let other_user = {
            let connection = state.db_connection.lock().unwrap();
            crate::test_utils::insert_test_user(&connection, "other@test.com")
        };
        let account_id_text = account_id.to_string();
        let multipart = must_make_multipart(&[
            text_part("account_id", &account_id_text),
            file_part("text/csv", TEST_CSV),
        ])
        .await;

        let result =
            import_transactions(State(state.clone()), Extension(other_user), multipart).await;

        assert_eq!(result.err(), Some(Error::InvalidAccount(account_id)));
        assert_eq!(transaction_count(&state), 0);
    }

    #[tokio::test]
    async fn missing_account_id_is_rejected() {
        let (state, user_id, _) = setup();
        let multipart = must_make_multipart(&[file_part("text/csv", TEST_CSV)]).await;

        let result = import_transactions(State(state), Extension(user_id), multipart).await;

        assert_eq!(
            result.err(),
            Some(Error::MultipartError(
                "missing field 'account_id'".to_owned()
            ))
        );
    }
}
