use crate::domain::model::Batch;
use std::collections::HashSet;
use std::path::PathBuf;

/// 將檔案清單切成 `worker_count` 個大小相差不超過 1 的批次
///
/// 每個批次先從清單前段依序取得 `len / worker_count` 個檔案，
/// 剩下的檔案再依序各分一個給前面的批次。重複的路徑只保留第一次出現。
/// worker 數為 0 或多於檔案數時回傳空清單。
pub fn partition<P: Into<PathBuf> + Clone>(file_paths: &[P], worker_count: usize) -> Vec<Batch> {
    let files = distinct_paths(file_paths);

    if worker_count == 0 || worker_count > files.len() {
        return Vec::new();
    }

    let per_batch = files.len() / worker_count;
    let first_set_len = per_batch * worker_count;

    let mut batches: Vec<Batch> = files[..first_set_len]
        .chunks(per_batch)
        .enumerate()
        .map(|(worker_id, chunk)| Batch {
            worker_id,
            files: chunk.to_vec(),
        })
        .collect();

    for (batch, leftover) in batches.iter_mut().zip(&files[first_set_len..]) {
        batch.files.push(leftover.clone());
    }

    batches
}

/// 去除重複路徑，保留第一次出現的順序
pub fn distinct_paths<P: Into<PathBuf> + Clone>(file_paths: &[P]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    file_paths
        .iter()
        .cloned()
        .map(Into::<PathBuf>::into)
        .filter(|path| seen.insert(path.clone()))
        .collect()
}
