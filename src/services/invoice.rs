//! Invoice engine: orchestrates stock deduction, wallet debit/credit,
//! discount math, and the denormalized invoice responses.
//!
//! None of the multi-step flows run inside a cross-document transaction.
//! Stock is decremented line by line as it is checked; a failure on a later
//! line leaves earlier decrements committed, and a wallet failure leaves all
//! stock decrements committed. Callers treat such partial failures as
//! requiring manual reconciliation.

use bson::oid::ObjectId;
use bson::{doc, Bson, DateTime, Document};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::options::FindOptions;
use mongodb::{Collection, Database};

use crate::db;
use crate::dtos::{InvoiceCreate, InvoiceItemResponse, InvoiceResponse, InvoiceUpdate};
use crate::models::{Customer, DiscountType, Invoice, InvoiceFilter, InvoiceItem, PaymentStatus};
use crate::services::catalog::CatalogService;
use crate::services::error::ServiceError;
use crate::services::wallet::WalletService;

/// The unit price for a line: an explicit positive price wins, zero means
/// "use the catalog selling price".
pub(crate) fn effective_unit_price(given: f64, catalog_price: f64) -> f64 {
    if given > 0.0 {
        given
    } else {
        catalog_price
    }
}

/// Discount amount and final total for a subtotal. The discount amount is
/// clamped to [0, subtotal]; the total never goes negative.
pub(crate) fn compute_discount(
    subtotal: f64,
    discount: f64,
    discount_type: DiscountType,
) -> (f64, f64) {
    if discount <= 0.0 {
        return (0.0, subtotal);
    }

    let raw = match discount_type {
        DiscountType::Percentage => subtotal * discount / 100.0,
        DiscountType::Fixed => discount,
    };
    let discount_amount = raw.min(subtotal).max(0.0);
    let total = (subtotal - discount_amount).max(0.0);

    (discount_amount, total)
}

#[derive(Clone)]
pub struct InvoiceService {
    invoices: Collection<Invoice>,
    items: Collection<InvoiceItem>,
    /// Untyped view of the items collection for tolerant reads of legacy
    /// documents with missing sub-fields.
    item_docs: Collection<Document>,
    customers: Collection<Customer>,
    catalog: CatalogService,
    wallet: WalletService,
}

impl InvoiceService {
    pub fn new(db: &Database, catalog: CatalogService, wallet: WalletService) -> Self {
        Self {
            invoices: db.collection(db::INVOICES),
            items: db.collection(db::INVOICE_ITEMS),
            item_docs: db.collection(db::INVOICE_ITEMS),
            customers: db.collection(db::CUSTOMERS),
            catalog,
            wallet,
        }
    }

    pub async fn create(&self, input: &InvoiceCreate) -> Result<InvoiceResponse, ServiceError> {
        let customer_oid = parse_object_id(&input.customer_id)
            .ok_or(ServiceError::CustomerNotFound)?;
        let customer = self
            .customers
            .find_one(doc! { "_id": customer_oid }, None)
            .await?
            .ok_or(ServiceError::CustomerNotFound)?;

        // Per-line check and immediate decrement. Not batched: a failure on a
        // later line leaves earlier decrements in place.
        let mut subtotal = 0.0;
        let mut lines: Vec<(String, i64, f64)> = Vec::with_capacity(input.invoice_items.len());
        for item in &input.invoice_items {
            let product_oid = parse_object_id(&item.product_id)
                .ok_or_else(|| ServiceError::ProductNotFound(item.product_id.clone()))?;
            let product = self
                .catalog
                .find_product(&product_oid)
                .await?
                .ok_or_else(|| ServiceError::ProductNotFound(item.product_id.clone()))?;

            if product.quantity < item.quantity {
                return Err(ServiceError::InsufficientStock(product.name));
            }

            let price = effective_unit_price(item.price, product.selling_price);
            subtotal += price * item.quantity as f64;
            lines.push((item.product_id.clone(), item.quantity, price));

            self.catalog.adjust_stock(&product_oid, -item.quantity).await?;
        }

        let discount = input.discount.unwrap_or(0.0);
        let discount_type = input.discount_type.unwrap_or_default();
        let (discount_amount, total) = compute_discount(subtotal, discount, discount_type);

        let wallet_payment = input.wallet_payment.unwrap_or(0.0);
        if wallet_payment > 0.0 {
            self.wallet
                .debit(&customer_oid, wallet_payment, "Payment from new invoice")
                .await?;
        }

        let wallet_add = input.wallet_add.unwrap_or(0.0);
        if wallet_add > 0.0 {
            self.wallet
                .credit(&customer_oid, wallet_add, "Deposit from new invoice")
                .await?;
        }

        let now = DateTime::now();
        let invoice = Invoice {
            id: None,
            customer_id: input.customer_id.clone(),
            subtotal,
            discount,
            discount_type,
            discount_amount,
            total,
            status: input.status.unwrap_or_default(),
            wallet_payment,
            wallet_add,
            notes: input.notes.clone(),
            created_at: now,
            updated_at: Some(now),
        };
        let result = self.invoices.insert_one(&invoice, None).await?;
        let invoice_id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| ServiceError::Internal(anyhow::anyhow!("insert returned no id")))?;

        if wallet_payment > 0.0 || wallet_add > 0.0 {
            self.wallet
                .link_pending(&customer_oid, &invoice_id.to_hex())
                .await?;
        }

        let mut item_responses = Vec::with_capacity(lines.len());
        for (product_id, quantity, price) in lines {
            let line = InvoiceItem {
                id: None,
                invoice_id: invoice_id.to_hex(),
                product_id: product_id.clone(),
                quantity,
                price,
            };
            let inserted = self.items.insert_one(&line, None).await?;
            item_responses.push(InvoiceItemResponse {
                id: inserted
                    .inserted_id
                    .as_object_id()
                    .map(|id| id.to_hex())
                    .unwrap_or_default(),
                product_id,
                product_name: None,
                quantity,
                price,
            });
        }

        tracing::info!(
            invoice_id = %invoice_id,
            customer_id = %input.customer_id,
            total,
            "Invoice created"
        );

        Ok(InvoiceResponse {
            id: invoice_id.to_hex(),
            customer_id: input.customer_id.clone(),
            customer_name: customer.name,
            subtotal,
            discount,
            discount_type,
            discount_amount,
            total,
            status: invoice.status,
            wallet_payment,
            wallet_add,
            notes: invoice.notes,
            created_at: now.to_chrono(),
            updated_at: Some(now.to_chrono()),
            invoice_items: item_responses,
        })
    }

    pub async fn get_by_id(&self, id: &ObjectId) -> Result<InvoiceResponse, ServiceError> {
        let invoice = self
            .invoices
            .find_one(doc! { "_id": id }, None)
            .await?
            .ok_or(ServiceError::InvoiceNotFound)?;
        self.assemble(invoice, false).await
    }

    pub async fn list(
        &self,
        filter: &InvoiceFilter,
        skip: u64,
        limit: i64,
    ) -> Result<(Vec<InvoiceResponse>, u64), ServiceError> {
        let query = build_filter_query(filter);
        let total = self.invoices.count_documents(query.clone(), None).await?;

        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .skip(skip)
            .limit(limit)
            .build();
        let cursor = self.invoices.find(query, options).await?;
        let invoices: Vec<Invoice> = cursor.try_collect().await?;

        let mut responses = Vec::with_capacity(invoices.len());
        for invoice in invoices {
            responses.push(self.assemble(invoice, false).await?);
        }

        Ok((responses, total))
    }

    pub async fn update(
        &self,
        id: &ObjectId,
        update: &InvoiceUpdate,
    ) -> Result<InvoiceResponse, ServiceError> {
        let invoice = self
            .invoices
            .find_one(doc! { "_id": id }, None)
            .await?
            .ok_or(ServiceError::InvoiceNotFound)?;

        if let Some(customer_id) = &update.customer_id {
            let oid = parse_object_id(customer_id).ok_or(ServiceError::CustomerNotFound)?;
            self.customers
                .find_one(doc! { "_id": oid }, None)
                .await?
                .ok_or(ServiceError::CustomerNotFound)?;
        }

        let mut set = doc! { "updated_at": DateTime::now() };

        // Replacing the item set: put every old line's stock back, drop the
        // lines, then run the same check-and-decrement loop over the new
        // list and recompute the money fields from scratch.
        if let Some(new_items) = &update.invoice_items {
            let existing = self.raw_items_of(&id.to_hex()).await?;
            for item in &existing {
                let quantity = item.get_i64("quantity").unwrap_or_else(|_| {
                    item.get_i32("quantity").map(i64::from).unwrap_or(0)
                });
                if let Some(oid) = item
                    .get_str("product_id")
                    .ok()
                    .and_then(parse_object_id)
                {
                    self.catalog.adjust_stock(&oid, quantity).await?;
                }
            }
            self.item_docs
                .delete_many(doc! { "invoice_id": id.to_hex() }, None)
                .await?;

            let mut subtotal = 0.0;
            for item in new_items {
                let product_oid = parse_object_id(&item.product_id)
                    .ok_or_else(|| ServiceError::ProductNotFound(item.product_id.clone()))?;
                let product = self
                    .catalog
                    .find_product(&product_oid)
                    .await?
                    .ok_or_else(|| ServiceError::ProductNotFound(item.product_id.clone()))?;

                if product.quantity < item.quantity {
                    return Err(ServiceError::InsufficientStock(product.name));
                }

                let price = effective_unit_price(item.price, product.selling_price);
                subtotal += price * item.quantity as f64;

                let line = InvoiceItem {
                    id: None,
                    invoice_id: id.to_hex(),
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                    price,
                };
                self.items.insert_one(&line, None).await?;
                self.catalog.adjust_stock(&product_oid, -item.quantity).await?;
            }

            let discount = update.discount.unwrap_or(0.0);
            let discount_type = update.discount_type.unwrap_or_default();
            let (discount_amount, total) = compute_discount(subtotal, discount, discount_type);

            set.insert("subtotal", subtotal);
            set.insert("discount", discount);
            set.insert(
                "discount_type",
                bson::to_bson(&discount_type).map_err(|e| ServiceError::Internal(e.into()))?,
            );
            set.insert("discount_amount", discount_amount);
            set.insert("total", total);
        }

        // Wallet amounts are applied as one-shot operations every time they
        // are present; repeating a call with the same wallet_payment debits
        // again. Known non-idempotency carried over from the source system.
        let wallet_customer = update
            .customer_id
            .clone()
            .unwrap_or_else(|| invoice.customer_id.clone());
        if let Some(wallet_payment) = update.wallet_payment {
            if wallet_payment > 0.0 {
                let oid =
                    parse_object_id(&wallet_customer).ok_or(ServiceError::CustomerNotFound)?;
                self.wallet
                    .debit_for_invoice(
                        &oid,
                        wallet_payment,
                        &format!("Payment from invoice {}", id.to_hex()),
                        &id.to_hex(),
                    )
                    .await?;
                set.insert("wallet_payment", wallet_payment);
            }
        }
        if let Some(wallet_add) = update.wallet_add {
            if wallet_add > 0.0 {
                let oid =
                    parse_object_id(&wallet_customer).ok_or(ServiceError::CustomerNotFound)?;
                self.wallet
                    .credit_for_invoice(
                        &oid,
                        wallet_add,
                        &format!("Deposit from invoice {}", id.to_hex()),
                        &id.to_hex(),
                    )
                    .await?;
                set.insert("wallet_add", wallet_add);
            }
        }

        if let Some(customer_id) = &update.customer_id {
            set.insert("customer_id", customer_id);
        }
        if let Some(notes) = &update.notes {
            set.insert("notes", notes);
        }
        if let Some(status) = update.status {
            set.insert(
                "status",
                bson::to_bson(&status).map_err(|e| ServiceError::Internal(e.into()))?,
            );
        }

        self.invoices
            .update_one(doc! { "_id": id }, doc! { "$set": set }, None)
            .await?;

        self.get_by_id(id).await
    }

    pub async fn update_status(
        &self,
        id: &ObjectId,
        status: PaymentStatus,
    ) -> Result<InvoiceResponse, ServiceError> {
        let result = self
            .invoices
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "status": bson::to_bson(&status).map_err(|e| ServiceError::Internal(e.into()))?,
                    "updated_at": DateTime::now(),
                } },
                None,
            )
            .await?;
        if result.matched_count == 0 {
            return Err(ServiceError::InvoiceNotFound);
        }

        self.get_by_id(id).await
    }

    /// Delete an invoice: stock goes back line by line, the lines go away
    /// with the invoice. Wallet transactions stay untouched; the ledger is
    /// the audit trail.
    pub async fn delete(&self, id: &ObjectId) -> Result<(), ServiceError> {
        self.invoices
            .find_one(doc! { "_id": id }, None)
            .await?
            .ok_or(ServiceError::InvoiceNotFound)?;

        let items = self.raw_items_of(&id.to_hex()).await?;
        for item in &items {
            let quantity = item.get_i64("quantity").unwrap_or_else(|_| {
                item.get_i32("quantity").map(i64::from).unwrap_or(0)
            });
            if let Some(oid) = item
                .get_str("product_id")
                .ok()
                .and_then(parse_object_id)
            {
                self.catalog.adjust_stock(&oid, quantity).await?;
            }
        }

        self.item_docs
            .delete_many(doc! { "invoice_id": id.to_hex() }, None)
            .await?;
        self.invoices.delete_one(doc! { "_id": id }, None).await?;

        tracing::info!(invoice_id = %id, restored_lines = items.len(), "Invoice deleted");
        Ok(())
    }

    /// All invoices for one customer, newest first. Legacy documents store
    /// customer_id as either a hex string or a native ObjectId, so the query
    /// matches both forms.
    pub async fn for_customer(
        &self,
        customer_id: &str,
    ) -> Result<Vec<InvoiceResponse>, ServiceError> {
        let mut forms: Vec<Bson> = vec![Bson::String(customer_id.to_string())];
        if let Some(oid) = parse_object_id(customer_id) {
            forms.push(Bson::ObjectId(oid));
        }

        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();
        let cursor = self
            .invoices
            .find(doc! { "customer_id": { "$in": forms } }, options)
            .await?;
        let invoices: Vec<Invoice> = cursor.try_collect().await?;

        let mut responses = Vec::with_capacity(invoices.len());
        for invoice in invoices {
            responses.push(self.assemble(invoice, true).await?);
        }
        Ok(responses)
    }

    /// Aggregate figures for the dashboard: counts per status, paid revenue,
    /// and today's activity.
    pub async fn statistics(&self) -> Result<InvoiceStatistics, ServiceError> {
        let total_invoices = self.invoices.count_documents(doc! {}, None).await?;
        let paid = self
            .invoices
            .count_documents(doc! { "status": "Paid" }, None)
            .await?;
        let pending = self
            .invoices
            .count_documents(doc! { "status": "Pending" }, None)
            .await?;
        let partial = self
            .invoices
            .count_documents(doc! { "status": "Partial" }, None)
            .await?;

        let total_revenue = self.sum_totals(doc! { "status": "Paid" }).await?;

        let today_start = DateTime::from_chrono(
            Utc::now()
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .unwrap_or_default()
                .and_utc(),
        );
        let today_filter = doc! { "created_at": { "$gte": today_start } };
        let today_invoices = self
            .invoices
            .count_documents(today_filter.clone(), None)
            .await?;
        let mut today_paid = today_filter;
        today_paid.insert("status", "Paid");
        let today_revenue = self.sum_totals(today_paid).await?;

        Ok(InvoiceStatistics {
            total_invoices,
            paid_invoices: paid,
            pending_invoices: pending,
            partial_invoices: partial,
            total_revenue,
            today_invoices,
            today_revenue,
        })
    }

    async fn sum_totals(&self, filter: Document) -> Result<f64, ServiceError> {
        let pipeline = vec![
            doc! { "$match": filter },
            doc! { "$group": { "_id": null, "sum": { "$sum": "$total" } } },
        ];
        let mut cursor = self.invoices.aggregate(pipeline, None).await?;
        if let Some(doc) = cursor.try_next().await? {
            Ok(doc.get_f64("sum").unwrap_or(0.0))
        } else {
            Ok(0.0)
        }
    }

    async fn raw_items_of(&self, invoice_id: &str) -> Result<Vec<Document>, ServiceError> {
        let cursor = self
            .item_docs
            .find(doc! { "invoice_id": invoice_id }, None)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Join customer name and line items into the response shape. Item
    /// sub-fields missing from legacy documents default instead of failing
    /// the whole read.
    async fn assemble(
        &self,
        invoice: Invoice,
        with_product_names: bool,
    ) -> Result<InvoiceResponse, ServiceError> {
        let invoice_id = invoice
            .id
            .ok_or_else(|| ServiceError::Internal(anyhow::anyhow!("invoice without id")))?;

        let customer_name = match parse_object_id(&invoice.customer_id) {
            Some(oid) => self
                .customers
                .find_one(doc! { "_id": oid }, None)
                .await?
                .map(|c| c.name),
            None => None,
        }
        .unwrap_or_else(|| "Unknown Customer".to_string());

        let docs = self.raw_items_of(&invoice_id.to_hex()).await?;
        let mut invoice_items = Vec::with_capacity(docs.len());
        for item in docs {
            let product_id = item.get_str("product_id").unwrap_or("unknown").to_string();
            let product_name = if with_product_names {
                self.product_name_of(&product_id).await?
            } else {
                None
            };
            invoice_items.push(InvoiceItemResponse {
                id: item
                    .get_object_id("_id")
                    .map(|id| id.to_hex())
                    .unwrap_or_default(),
                product_id,
                product_name,
                quantity: item.get_i64("quantity").unwrap_or_else(|_| {
                    item.get_i32("quantity").map(i64::from).unwrap_or(0)
                }),
                price: item
                    .get_f64("price")
                    .unwrap_or_else(|_| item.get_i32("price").map(f64::from).unwrap_or(0.0)),
            });
        }

        Ok(InvoiceResponse {
            id: invoice_id.to_hex(),
            customer_id: invoice.customer_id,
            customer_name,
            subtotal: invoice.subtotal,
            discount: invoice.discount,
            discount_type: invoice.discount_type,
            discount_amount: invoice.discount_amount,
            total: invoice.total,
            status: invoice.status,
            wallet_payment: invoice.wallet_payment,
            wallet_add: invoice.wallet_add,
            notes: invoice.notes,
            created_at: invoice.created_at.to_chrono(),
            updated_at: invoice.updated_at.map(|d| d.to_chrono()),
            invoice_items,
        })
    }

    async fn product_name_of(&self, product_id: &str) -> Result<Option<String>, ServiceError> {
        if let Some(oid) = parse_object_id(product_id) {
            if let Some(product) = self.catalog.find_product(&oid).await? {
                return Ok(Some(product.name));
            }
        }
        // Legacy lines reference the external product code instead
        Ok(self
            .catalog
            .find_product_by_code(product_id)
            .await?
            .map(|p| p.name))
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct InvoiceStatistics {
    pub total_invoices: u64,
    pub paid_invoices: u64,
    pub pending_invoices: u64,
    pub partial_invoices: u64,
    pub total_revenue: f64,
    pub today_invoices: u64,
    pub today_revenue: f64,
}

fn build_filter_query(filter: &InvoiceFilter) -> Document {
    let mut query = Document::new();

    if let Some(customer_id) = &filter.customer_id {
        query.insert("customer_id", customer_id);
    }
    if let Some(status) = filter.status {
        query.insert("status", status.as_str());
    }

    let mut total_range = Document::new();
    if let Some(min) = filter.min_total {
        total_range.insert("$gte", min);
    }
    if let Some(max) = filter.max_total {
        total_range.insert("$lte", max);
    }
    if !total_range.is_empty() {
        query.insert("total", total_range);
    }

    let mut date_range = Document::new();
    if let Some(min) = filter.min_date {
        date_range.insert("$gte", min);
    }
    if let Some(max) = filter.max_date {
        date_range.insert("$lte", max);
    }
    if !date_range.is_empty() {
        query.insert("created_at", date_range);
    }

    query
}

fn parse_object_id(s: &str) -> Option<ObjectId> {
    ObjectId::parse_str(s).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_price_wins_over_catalog() {
        assert_eq!(effective_unit_price(12.5, 10.0), 12.5);
    }

    #[test]
    fn zero_price_falls_back_to_catalog() {
        assert_eq!(effective_unit_price(0.0, 10.0), 10.0);
        assert_eq!(effective_unit_price(-1.0, 10.0), 10.0);
    }

    #[test]
    fn percentage_discount() {
        let (amount, total) = compute_discount(200.0, 10.0, DiscountType::Percentage);
        assert_eq!(amount, 20.0);
        assert_eq!(total, 180.0);
    }

    #[test]
    fn fixed_discount() {
        let (amount, total) = compute_discount(200.0, 35.0, DiscountType::Fixed);
        assert_eq!(amount, 35.0);
        assert_eq!(total, 165.0);
    }

    #[test]
    fn discount_clamped_to_subtotal() {
        let (amount, total) = compute_discount(50.0, 80.0, DiscountType::Fixed);
        assert_eq!(amount, 50.0);
        assert_eq!(total, 0.0);

        let (amount, total) = compute_discount(50.0, 150.0, DiscountType::Percentage);
        assert_eq!(amount, 50.0);
        assert_eq!(total, 0.0);
    }

    #[test]
    fn zero_or_negative_discount_is_a_noop() {
        assert_eq!(compute_discount(100.0, 0.0, DiscountType::Percentage), (0.0, 100.0));
        assert_eq!(compute_discount(100.0, -5.0, DiscountType::Fixed), (0.0, 100.0));
    }

    #[test]
    fn totals_invariant_holds() {
        // total == max(0, subtotal - discount_amount) across representative inputs
        for (subtotal, discount, ty) in [
            (200.0, 10.0, DiscountType::Percentage),
            (99.5, 99.5, DiscountType::Fixed),
            (10.0, 100.0, DiscountType::Percentage),
            (0.0, 25.0, DiscountType::Fixed),
        ] {
            let (amount, total) = compute_discount(subtotal, discount, ty);
            assert!(amount >= 0.0 && amount <= subtotal);
            assert_eq!(total, (subtotal - amount).max(0.0));
        }
    }

    #[test]
    fn filter_query_builds_ranges() {
        let filter = InvoiceFilter {
            customer_id: Some("abc".to_string()),
            status: Some(PaymentStatus::Paid),
            min_total: Some(10.0),
            max_total: Some(100.0),
            min_date: None,
            max_date: None,
        };
        let query = build_filter_query(&filter);
        assert_eq!(query.get_str("customer_id").unwrap(), "abc");
        assert_eq!(query.get_str("status").unwrap(), "Paid");
        let range = query.get_document("total").unwrap();
        assert_eq!(range.get_f64("$gte").unwrap(), 10.0);
        assert_eq!(range.get_f64("$lte").unwrap(), 100.0);
        assert!(query.get("created_at").is_none());
    }
}
