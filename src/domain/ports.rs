use crate::domain::model::SchemaPolicy;
use crate::utils::error::Result;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn data_dir(&self) -> &str;
    fn file_extension(&self) -> &str;
    fn delimiter(&self) -> char;
    fn worker_count(&self) -> usize;
    fn value_column(&self) -> &str;
    fn group_column(&self) -> &str;
    fn stats_columns(&self) -> &[String];
    fn schema_policy(&self) -> SchemaPolicy;
    fn output_path(&self) -> &str;
}
