// Driver package / 驱动包
pub mod selectel;

use crate::storage::StorageManager;

/// Register all drivers to StorageManager / 注册所有驱动
pub async fn register_all(manager: &StorageManager) -> anyhow::Result<()> {
    // Register Selectel cloud storage driver / 注册Selectel云存储驱动
    manager.register_factory(Box::new(selectel::SelectelDriverFactory)).await?;
    Ok(())
}
