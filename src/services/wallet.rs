//! Wallet ledger: the mutable running balance lives on the customer
//! document; every change also appends an immutable `wallet_transactions`
//! entry. Entries written while the invoice is still being created start
//! with a null invoice id and are back-filled once it exists; movements
//! against an existing invoice are linked at insert time.

use bson::doc;
use bson::oid::ObjectId;
use futures::TryStreamExt;
use mongodb::options::FindOptions;
use mongodb::{Collection, Database};

use crate::db;
use crate::models::{Customer, TransactionType, WalletTransaction};
use crate::services::error::ServiceError;

#[derive(Clone)]
pub struct WalletService {
    customers: Collection<Customer>,
    transactions: Collection<WalletTransaction>,
}

impl WalletService {
    pub fn new(db: &Database) -> Self {
        Self {
            customers: db.collection(db::CUSTOMERS),
            transactions: db.collection(db::WALLET_TRANSACTIONS),
        }
    }

    pub async fn balance_of(&self, customer_id: &ObjectId) -> Result<f64, ServiceError> {
        let customer = self
            .customers
            .find_one(doc! { "_id": customer_id }, None)
            .await?
            .ok_or(ServiceError::CustomerNotFound)?;
        Ok(customer.wallet_balance)
    }

    /// Deduct from the customer's balance. Fails with insufficient funds
    /// before any write; the balance decrement itself uses `$inc` so the
    /// single-field update is atomic. The ledger entry starts unlinked.
    pub async fn debit(
        &self,
        customer_id: &ObjectId,
        amount: f64,
        description: &str,
    ) -> Result<(), ServiceError> {
        self.debit_inner(customer_id, amount, description, None).await
    }

    /// Debit against an invoice that already exists; the ledger entry is
    /// written with the invoice id up front, never back-filled.
    pub async fn debit_for_invoice(
        &self,
        customer_id: &ObjectId,
        amount: f64,
        description: &str,
        invoice_id: &str,
    ) -> Result<(), ServiceError> {
        self.debit_inner(customer_id, amount, description, Some(invoice_id))
            .await
    }

    async fn debit_inner(
        &self,
        customer_id: &ObjectId,
        amount: f64,
        description: &str,
        invoice_id: Option<&str>,
    ) -> Result<(), ServiceError> {
        if amount <= 0.0 {
            return Err(ServiceError::Validation(
                "Debit amount must be greater than zero".to_string(),
            ));
        }

        let balance = self.balance_of(customer_id).await?;
        if balance < amount {
            return Err(ServiceError::InsufficientFunds {
                balance,
                required: amount,
            });
        }

        self.customers
            .update_one(
                doc! { "_id": customer_id },
                doc! { "$inc": { "wallet_balance": -amount } },
                None,
            )
            .await?;

        let entry = WalletTransaction::new(
            customer_id,
            -amount,
            TransactionType::Deduct,
            description,
            invoice_id,
        );
        self.transactions.insert_one(&entry, None).await?;
        Ok(())
    }

    /// Add to the customer's balance and log the ledger entry.
    pub async fn credit(
        &self,
        customer_id: &ObjectId,
        amount: f64,
        description: &str,
    ) -> Result<(), ServiceError> {
        self.credit_inner(customer_id, amount, description, None).await
    }

    /// Credit tied to an existing invoice; linked at insert time.
    pub async fn credit_for_invoice(
        &self,
        customer_id: &ObjectId,
        amount: f64,
        description: &str,
        invoice_id: &str,
    ) -> Result<(), ServiceError> {
        self.credit_inner(customer_id, amount, description, Some(invoice_id))
            .await
    }

    async fn credit_inner(
        &self,
        customer_id: &ObjectId,
        amount: f64,
        description: &str,
        invoice_id: Option<&str>,
    ) -> Result<(), ServiceError> {
        if amount <= 0.0 {
            return Err(ServiceError::Validation(
                "Credit amount must be greater than zero".to_string(),
            ));
        }

        let updated = self
            .customers
            .update_one(
                doc! { "_id": customer_id },
                doc! { "$inc": { "wallet_balance": amount } },
                None,
            )
            .await?;
        if updated.matched_count == 0 {
            return Err(ServiceError::CustomerNotFound);
        }

        let entry = WalletTransaction::new(
            customer_id,
            amount,
            TransactionType::Add,
            description,
            invoice_id,
        );
        self.transactions.insert_one(&entry, None).await?;
        Ok(())
    }

    /// Back-fill the invoice id onto this customer's pending ledger entries.
    /// Second phase of the two-phase linkage used only by invoice creation,
    /// where the entries are written before the invoice document exists.
    pub async fn link_pending(
        &self,
        customer_id: &ObjectId,
        invoice_id: &str,
    ) -> Result<u64, ServiceError> {
        let result = self
            .transactions
            .update_many(
                doc! { "customer_id": customer_id.to_hex(), "invoice_id": null },
                doc! { "$set": { "invoice_id": invoice_id } },
                None,
            )
            .await?;
        Ok(result.modified_count)
    }

    pub async fn list_for_customer(
        &self,
        customer_id: &ObjectId,
    ) -> Result<Vec<WalletTransaction>, ServiceError> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();
        let cursor = self
            .transactions
            .find(doc! { "customer_id": customer_id.to_hex() }, options)
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_linked_entries_carry_the_id_up_front() {
        let customer = ObjectId::new();
        let entry = WalletTransaction::new(
            &customer,
            -50.0,
            TransactionType::Deduct,
            "Payment from invoice 64f000000000000000000009",
            Some("64f000000000000000000009"),
        );
        assert_eq!(entry.invoice_id.as_deref(), Some("64f000000000000000000009"));
        assert_eq!(entry.customer_id, customer.to_hex());
        assert_eq!(entry.amount, -50.0);
    }

    #[test]
    fn unlinked_entries_stay_pending() {
        let customer = ObjectId::new();
        let deposit =
            WalletTransaction::new(&customer, 20.0, TransactionType::Add, "Deposit", None);
        assert!(deposit.invoice_id.is_none());
        assert_eq!(deposit.amount, 20.0);
    }
}
