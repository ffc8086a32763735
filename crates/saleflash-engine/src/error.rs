use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Db(#[from] saleflash_db::DbError),

    #[error("observer error: {0}")]
    Observer(String),
}
