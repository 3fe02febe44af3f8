use crate::drug::{Drug, DrugDeletion, DrugId, DrugPatch, NewDrug};
use crate::environment::Clock;
use crate::error::{PharmacyError, Result};
use crate::repository::DrugRepository;
use crate::user::Principal;
use std::sync::Arc;

/// Drug inventory management.
///
/// Reads are open to every signed-in role; writes require `ADMIN`.
#[derive(Clone)]
pub struct InventoryService<R> {
    drugs: R,
    clock: Arc<dyn Clock>,
}

impl<R: DrugRepository> InventoryService<R> {
    /// Create a service over the given store.
    pub fn new(drugs: R, clock: Arc<dyn Clock>) -> Self {
        Self { drugs, clock }
    }

    /// All drugs, newest first.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn list(&self, _principal: &Principal) -> Result<Vec<Drug>> {
        self.drugs.list_drugs().await
    }

    /// One drug.
    ///
    /// # Errors
    ///
    /// [`PharmacyError::NotFound`] if the drug does not exist.
    pub async fn get(&self, _principal: &Principal, id: DrugId) -> Result<Drug> {
        self.drugs
            .get_drug(id)
            .await?
            .ok_or_else(|| PharmacyError::not_found("Drug", id))
    }

    /// Add a drug to inventory.
    ///
    /// # Errors
    ///
    /// - Caller is not an administrator → [`PharmacyError::Forbidden`]
    /// - Invalid fields → [`PharmacyError::InvalidInput`]
    pub async fn create(&self, principal: &Principal, new_drug: NewDrug) -> Result<Drug> {
        principal.require_admin("Creating drugs")?;

        let drug = new_drug.into_drug(DrugId::new(), self.clock.now())?;
        let drug = self.drugs.insert_drug(&drug).await?;

        tracing::info!(drug_id = %drug.id, name = %drug.name, quantity = drug.quantity, "Drug created");
        Ok(drug)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// - Caller is not an administrator → [`PharmacyError::Forbidden`]
    /// - Invalid fields → [`PharmacyError::InvalidInput`]
    /// - Unknown drug → [`PharmacyError::NotFound`]
    pub async fn update(&self, principal: &Principal, id: DrugId, patch: DrugPatch) -> Result<Drug> {
        principal.require_admin("Updating drugs")?;

        let patch = patch.validate()?;
        let drug = self.drugs.update_drug(id, &patch, self.clock.now()).await?;

        tracing::info!(drug_id = %drug.id, quantity = drug.quantity, "Drug updated");
        Ok(drug)
    }

    /// Remove a drug and every sale item that references it.
    ///
    /// Totals of the affected sales are left as recorded.
    ///
    /// # Errors
    ///
    /// - Caller is not an administrator → [`PharmacyError::Forbidden`]
    /// - Unknown drug → [`PharmacyError::NotFound`]
    pub async fn delete(&self, principal: &Principal, id: DrugId) -> Result<DrugDeletion> {
        principal.require_admin("Deleting drugs")?;

        let deletion = self.drugs.delete_drug(id).await?;

        if deletion.deleted_sale_items > 0 {
            tracing::warn!(
                drug_id = %id,
                deleted_sale_items = deletion.deleted_sale_items,
                "Drug deleted together with historical sale items"
            );
        } else {
            tracing::info!(drug_id = %id, "Drug deleted");
        }
        Ok(deletion)
    }
}
