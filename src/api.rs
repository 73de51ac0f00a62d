//! Local JSON API used by the front end. Handlers validate input, call the
//! store, and translate outcomes into HTTP statuses.

use std::path::PathBuf;

use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{Build, Request, Rocket, State};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::csv_io::{self, ImportSummary};
use crate::db::Store;
use crate::error::{StoreError, TransferError};
use crate::models::{
    AddOutcome, Category, CategoryId, CategoryTotal, NewTransaction, TransactionId,
    TransactionKind, TransactionRecord, WriteOutcome,
};
use crate::validation::{self, FormError};

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Responder)]
pub enum ApiError {
    #[response(status = 400)]
    BadRequest(Json<ErrorBody>),
    #[response(status = 404)]
    NotFound(Json<ErrorBody>),
    #[response(status = 409)]
    Conflict(Json<ErrorBody>),
    #[response(status = 500)]
    Internal(Json<ErrorBody>),
}

impl ApiError {
    fn body(message: impl Into<String>) -> Json<ErrorBody> {
        Json(ErrorBody {
            error: message.into(),
        })
    }

    fn bad_request(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(%message, "request rejected");
        ApiError::BadRequest(Self::body(message))
    }

    fn not_found(message: &str) -> Self {
        ApiError::NotFound(Self::body(message))
    }

    fn conflict(message: String) -> Self {
        ApiError::Conflict(Self::body(message))
    }

    fn internal(message: String) -> Self {
        error!(%message, "request failed");
        ApiError::Internal(Self::body(message))
    }
}

impl From<FormError> for ApiError {
    fn from(err: FormError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        if err.is_foreign_key_violation() {
            return ApiError::bad_request(CATEGORY_NOT_FOUND);
        }
        ApiError::internal(err.to_string())
    }
}

impl From<TransferError> for ApiError {
    fn from(err: TransferError) -> Self {
        if err.is_malformed_input() {
            ApiError::bad_request(err.to_string())
        } else {
            ApiError::internal(err.to_string())
        }
    }
}

type ApiResult<T> = Result<T, ApiError>;

const CATEGORY_NOT_FOUND: &str = "Категория не найдена";
const TRANSACTION_NOT_FOUND: &str = "Транзакция не найдена";

#[derive(Deserialize)]
struct CategoryForm {
    name: String,
    icon_path: Option<String>,
}

#[derive(Deserialize)]
struct TransactionForm {
    date: Option<String>,
    amount: String,
    #[serde(rename = "type", default)]
    kind: TransactionKind,
    category_id: Option<CategoryId>,
    note: Option<String>,
}

impl TransactionForm {
    fn validate(self) -> Result<NewTransaction, FormError> {
        Ok(NewTransaction {
            date: validation::parse_date(self.date.as_deref())?,
            amount: validation::parse_amount(&self.amount)?,
            kind: self.kind,
            category_id: self.category_id,
            note: validation::note(self.note),
        })
    }
}

#[derive(Deserialize)]
struct PathForm {
    path: PathBuf,
}

#[derive(Deserialize)]
struct ResetForm {
    confirmation: String,
}

#[derive(Serialize)]
struct Summary {
    balance: f64,
    expenses_by_category: Vec<CategoryTotal>,
}

#[derive(Serialize)]
struct ExportReport {
    rows: usize,
}

#[get("/summary")]
fn summary(store: &State<Store>) -> ApiResult<Json<Summary>> {
    Ok(Json(Summary {
        balance: store.get_balance()?,
        expenses_by_category: store.get_expenses_by_category()?,
    }))
}

#[get("/categories")]
fn categories(store: &State<Store>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(store.get_categories()?))
}

#[post("/categories", data = "<form>")]
fn add_category(
    store: &State<Store>,
    form: Json<CategoryForm>,
) -> ApiResult<status::Created<Json<Category>>> {
    let form = form.into_inner();
    let name = validation::category_name(&form.name)?;
    match store.add_category(name, form.icon_path.as_deref())? {
        AddOutcome::Created(id) => Ok(status::Created::new(format!("/api/categories/{id}")).body(
            Json(Category {
                id,
                name: name.to_string(),
                icon_path: form.icon_path,
            }),
        )),
        AddOutcome::AlreadyExists => Err(ApiError::conflict(format!(
            "Категория «{name}» уже существует"
        ))),
    }
}

#[put("/categories/<id>", data = "<form>")]
fn update_category(
    store: &State<Store>,
    id: CategoryId,
    form: Json<CategoryForm>,
) -> ApiResult<Json<Category>> {
    let form = form.into_inner();
    let name = validation::category_name(&form.name)?;
    match store.update_category(id, name, form.icon_path.as_deref())? {
        WriteOutcome::Applied => Ok(Json(Category {
            id,
            name: name.to_string(),
            icon_path: form.icon_path,
        })),
        WriteOutcome::NotFound => Err(ApiError::not_found(CATEGORY_NOT_FOUND)),
        WriteOutcome::NameTaken => Err(ApiError::conflict(format!(
            "Категория «{name}» уже существует"
        ))),
    }
}

#[delete("/categories/<id>")]
fn delete_category(store: &State<Store>, id: CategoryId) -> ApiResult<Status> {
    match store.delete_category(id)? {
        WriteOutcome::NotFound => Err(ApiError::not_found(CATEGORY_NOT_FOUND)),
        _ => Ok(Status::NoContent),
    }
}

#[get("/transactions?<limit>")]
fn transactions(store: &State<Store>, limit: Option<u32>) -> ApiResult<Json<Vec<TransactionRecord>>> {
    Ok(Json(store.get_transactions(limit)?))
}

#[get("/transactions/<id>")]
fn transaction(store: &State<Store>, id: TransactionId) -> ApiResult<Json<TransactionRecord>> {
    store
        .get_transaction(id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(TRANSACTION_NOT_FOUND))
}

#[post("/transactions", data = "<form>")]
fn add_transaction(
    store: &State<Store>,
    form: Json<TransactionForm>,
) -> ApiResult<status::Created<Json<TransactionRecord>>> {
    let new = form.into_inner().validate()?;
    let id = store.add_transaction(&new)?;
    let record = store
        .get_transaction(id)?
        .ok_or_else(|| ApiError::not_found(TRANSACTION_NOT_FOUND))?;
    Ok(status::Created::new(format!("/api/transactions/{id}")).body(Json(record)))
}

#[put("/transactions/<id>", data = "<form>")]
fn update_transaction(
    store: &State<Store>,
    id: TransactionId,
    form: Json<TransactionForm>,
) -> ApiResult<Json<TransactionRecord>> {
    let new = form.into_inner().validate()?;
    if store.update_transaction(id, &new)? == WriteOutcome::NotFound {
        return Err(ApiError::not_found(TRANSACTION_NOT_FOUND));
    }
    store
        .get_transaction(id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(TRANSACTION_NOT_FOUND))
}

#[delete("/transactions/<id>")]
fn delete_transaction(store: &State<Store>, id: TransactionId) -> ApiResult<Status> {
    match store.delete_transaction(id)? {
        WriteOutcome::NotFound => Err(ApiError::not_found(TRANSACTION_NOT_FOUND)),
        _ => Ok(Status::NoContent),
    }
}

#[post("/export", data = "<form>")]
fn export(store: &State<Store>, form: Json<PathForm>) -> ApiResult<Json<ExportReport>> {
    let rows = csv_io::export_all(store, &form.path)?;
    Ok(Json(ExportReport { rows }))
}

#[post("/import", data = "<form>")]
fn import(store: &State<Store>, form: Json<PathForm>) -> ApiResult<Json<ImportSummary>> {
    Ok(Json(csv_io::import_all(store, &form.path)?))
}

#[post("/reset", data = "<form>")]
fn reset(store: &State<Store>, form: Json<ResetForm>) -> ApiResult<Status> {
    validation::confirm_reset(&form.confirmation)?;
    store.clear_all()?;
    store.init_schema()?;
    Ok(Status::NoContent)
}

#[catch(default)]
fn json_catcher(status: Status, _request: &Request<'_>) -> (Status, Json<ErrorBody>) {
    let message = status.reason().unwrap_or("Unknown error");
    (status, ApiError::body(message))
}

/// Attaches the store and mounts the API under `/api`.
pub fn mount(rocket: Rocket<Build>, store: Store) -> Rocket<Build> {
    rocket
        .manage(store)
        .mount(
            "/api",
            routes![
                summary,
                categories,
                add_category,
                update_category,
                delete_category,
                transactions,
                transaction,
                add_transaction,
                update_transaction,
                delete_transaction,
                export,
                import,
                reset
            ],
        )
        .register("/api", catchers![json_catcher])
}
