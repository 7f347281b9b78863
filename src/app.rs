use crate::catalog::{Category, MAX_ALIASES, build_aliases, parse_price_list};
use crate::config::Config;
use crate::demand::{self, DemandLine, sanitise_quantity};
use crate::errors::{AppError, Result};
use crate::extract::{self, NOTE_NO_MATCH};
use crate::normalize::normalise_for_match;
use crate::ocr::TextRecognizer;
use crate::offer::{self, Offer};
use crate::state::{
    AppState, ExtractedProduct, PREVIEW_CEILING, PriceMeta, RequestDocument, now_rfc3339,
};
use crate::store::SnapshotStore;
use crate::tabular;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// One file handed to request ingestion.
#[derive(Debug)]
pub struct IncomingFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Batch summary for one ingestion run.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub documents: usize,
    pub auto_added: usize,
}

impl IngestReport {
    pub fn message(&self) -> String {
        let mut message = format!("{} belge kaydedildi.", self.documents);
        if self.auto_added > 0 {
            message.push_str(&format!(" {} ürün otomatik eklendi.", self.auto_added));
        }
        message
    }
}

/// Editable fields of one catalog item. Category is fixed at upload.
#[derive(Debug)]
pub struct ItemEdit {
    pub name: String,
    pub description: Option<String>,
    pub code: Option<String>,
    pub unit: String,
    pub unit_price: f64,
}

#[derive(Debug)]
pub struct DeleteOutcome {
    pub name: String,
    pub demand_removed: usize,
    pub requests_touched: usize,
}

#[derive(Debug)]
pub enum ClearOutcome {
    AlreadyEmpty,
    Cleared {
        items: usize,
        demand_removed: usize,
        requests_touched: usize,
    },
}

/// The application: owns the full state and its persistent store.
/// Every mutation persists the whole snapshot before returning.
pub struct App {
    state: AppState,
    store: SnapshotStore,
    ocr_languages: String,
}

impl App {
    /// Open against a store: resume from the stored snapshot when one
    /// exists, otherwise start fresh with the configured defaults.
    pub fn open(store: SnapshotStore, config: &Config) -> Result<Self> {
        let state = match store.load()? {
            Some(state) => state,
            None => {
                let mut state = AppState::default();
                if let Some(vat) = config.default_vat_rate {
                    state.settings.set_vat_rate(vat);
                }
                state
            }
        };
        Ok(Self {
            state,
            store,
            ocr_languages: config.extraction.ocr_languages.clone(),
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    fn persist(&self) -> Result<()> {
        self.store.save(&self.state)
    }

    /// Replace one category's price list from an uploaded workbook or
    /// delimited file. Returns the number of catalog items produced.
    pub fn upload_price_list(
        &mut self,
        category: Category,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<usize> {
        let sheets = tabular::decode_tabular(file_name, bytes)?;
        let rows = &sheets[0].records;
        let items = parse_price_list(&mut self.state.ids, category, rows);
        if items.is_empty() {
            return Err(AppError::Parse(format!(
                "no priced rows found in {file_name}"
            )));
        }
        let count = items.len();
        self.state.catalog.replace(category, items);
        self.state.price_meta.insert(
            category,
            PriceMeta {
                file_name: file_name.to_string(),
                uploaded_at: now_rfc3339(),
            },
        );
        self.persist()?;
        info!(category = %category, items = count, file = %file_name, "price list replaced");
        Ok(count)
    }

    /// Ingest customer request documents, one at a time: record each as a
    /// request document, run extraction and merge any matches into the
    /// demand list. Extraction problems become per-document notes, never
    /// errors; the batch persists once at the end.
    pub async fn ingest_request_files(
        &mut self,
        files: Vec<IncomingFile>,
        recognizer: &dyn TextRecognizer,
    ) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        for file in files {
            let doc_id = self.state.ids.next("request");
            let size = file.bytes.len() as u64;
            let extraction = extract::extract_from_document(
                &self.state.catalog,
                &file.name,
                &file.mime_type,
                &file.bytes,
                recognizer,
                &self.ocr_languages,
            )
            .await;

            let (extracted, note) = if extraction.matches.is_empty() {
                let note = extraction
                    .note
                    .unwrap_or_else(|| NOTE_NO_MATCH.to_string());
                (Vec::new(), note)
            } else {
                let outcome = demand::apply_matches(
                    &mut self.state.demand,
                    &mut self.state.ids,
                    Some(&doc_id),
                    extraction.matches,
                );
                report.auto_added += outcome.added;
                let extracted: Vec<ExtractedProduct> = outcome
                    .matches
                    .iter()
                    .map(|m| ExtractedProduct {
                        product_id: m.item.id.clone(),
                        product_name: m.item.name.clone(),
                        product_code: m.item.code.clone(),
                        category: m.item.category,
                        quantity: m.quantity,
                    })
                    .collect();
                let note = if outcome.added > 0 {
                    format!(
                        "{} ürün otomatik olarak talep listesine eklendi.",
                        outcome.added
                    )
                } else if outcome.updated > 0 {
                    "Var olan talep kalemleri belgeye göre güncellendi.".to_string()
                } else {
                    "Eşleşen ürünler zaten talep listesinde yer alıyor.".to_string()
                };
                (extracted, note)
            };

            let preview_payload = if size <= PREVIEW_CEILING {
                Some(file.bytes)
            } else {
                None
            };
            self.state.requests.push(RequestDocument {
                id: doc_id,
                name: file.name,
                size,
                mime_type: file.mime_type,
                uploaded_at: now_rfc3339(),
                preview_payload,
                extracted_products: extracted,
                extraction_note: note,
            });
            report.documents += 1;
        }
        self.persist()?;
        Ok(report)
    }

    /// Manual demand entry. Always appends a new line, even for a product
    /// already on the list. Unlike quantity edits and extraction, which
    /// coerce bad quantities to 1, a bad quantity typed into the form is
    /// rejected outright.
    pub fn add_demand_line(
        &mut self,
        category: Category,
        product_id: &str,
        quantity: f64,
    ) -> Result<DemandLine> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(AppError::Validation(format!(
                "quantity must be a positive number, got {quantity}"
            )));
        }
        let Some(item) = self
            .state
            .catalog
            .items(category)
            .iter()
            .find(|item| item.id == product_id)
        else {
            return Err(AppError::NotFound(format!(
                "no product {product_id} in the {category} price list"
            )));
        };
        let line = DemandLine {
            id: self.state.ids.next("demand"),
            request_id: None,
            category,
            product_id: item.id.clone(),
            product_name: item.name.clone(),
            product_code: item.code.clone(),
            unit: item.unit.clone(),
            unit_price: item.unit_price,
            quantity: sanitise_quantity(quantity),
        };
        let added = line.clone();
        self.state.demand.push(line);
        self.persist()?;
        Ok(added)
    }

    pub fn set_demand_quantity(&mut self, line_id: &str, quantity: f64) -> Result<u32> {
        let Some(line) = self.state.demand.iter_mut().find(|line| line.id == line_id) else {
            return Err(AppError::NotFound(format!("no demand line {line_id}")));
        };
        line.quantity = sanitise_quantity(quantity);
        let quantity = line.quantity;
        self.persist()?;
        Ok(quantity)
    }

    pub fn remove_demand_line(&mut self, line_id: &str) -> Result<DemandLine> {
        let Some(position) = self.state.demand.iter().position(|line| line.id == line_id) else {
            return Err(AppError::NotFound(format!("no demand line {line_id}")));
        };
        let removed = self.state.demand.remove(position);
        self.persist()?;
        Ok(removed)
    }

    /// Edit a catalog item in place and propagate the new display fields
    /// to demand lines and request snapshots referencing it. The alias set
    /// is rebuilt from the new fields, then topped up with the prior
    /// aliases so earlier match keys keep working.
    pub fn edit_item(&mut self, id: &str, edit: ItemEdit) -> Result<()> {
        let name = edit.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("product name cannot be empty".into()));
        }
        let unit = edit.unit.trim();
        if unit.is_empty() {
            return Err(AppError::Validation("unit cannot be empty".into()));
        }
        if !edit.unit_price.is_finite() || edit.unit_price < 0.0 {
            return Err(AppError::Validation(
                "unit price must be a non-negative number".into(),
            ));
        }
        let description = edit
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        let code = edit
            .code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        let state = &mut self.state;
        let Some(item) = state.catalog.get_mut(id) else {
            return Err(AppError::NotFound(format!("no catalog item {id}")));
        };
        let mut aliases = build_aliases(name, description.as_deref(), code.as_deref(), &item.source);
        let mut seen: Vec<String> = aliases.iter().map(|a| normalise_for_match(a)).collect();
        for alias in &item.aliases {
            if aliases.len() >= MAX_ALIASES {
                break;
            }
            let key = normalise_for_match(alias);
            if !key.is_empty() && !seen.contains(&key) {
                seen.push(key);
                aliases.push(alias.clone());
            }
        }
        item.name = name.to_string();
        item.description = description;
        item.code = code.clone();
        item.unit = unit.to_string();
        item.unit_price = edit.unit_price;
        item.aliases = aliases;

        let new_name = name.to_string();
        let new_unit = unit.to_string();
        let new_price = edit.unit_price;
        for line in state.demand.iter_mut().filter(|l| l.product_id == id) {
            line.product_name = new_name.clone();
            line.product_code = code.clone();
            line.unit = new_unit.clone();
            line.unit_price = new_price;
        }
        for doc in &mut state.requests {
            for product in doc
                .extracted_products
                .iter_mut()
                .filter(|p| p.product_id == id)
            {
                product.product_name = new_name.clone();
                product.product_code = code.clone();
            }
        }
        self.persist()
    }

    /// Delete one catalog item, cascading to demand lines and request
    /// snapshots that reference it. Requires explicit confirmation.
    pub fn delete_item(&mut self, id: &str, confirmed: bool) -> Result<DeleteOutcome> {
        if !confirmed {
            return Err(AppError::ConfirmationRequired(
                "deleting a product also removes its demand lines".into(),
            ));
        }
        let Some(item) = self.state.catalog.remove(id) else {
            return Err(AppError::NotFound(format!("no catalog item {id}")));
        };

        let before = self.state.demand.len();
        self.state.demand.retain(|line| line.product_id != id);
        let demand_removed = before - self.state.demand.len();

        let mut requests_touched = 0;
        for doc in &mut self.state.requests {
            let before = doc.extracted_products.len();
            doc.extracted_products.retain(|p| p.product_id != id);
            if doc.extracted_products.len() != before {
                requests_touched += 1;
            }
        }

        self.persist()?;
        info!(id = %id, demand_removed, requests_touched, "catalog item deleted");
        Ok(DeleteOutcome {
            name: item.name,
            demand_removed,
            requests_touched,
        })
    }

    /// Drop one category's whole price list, with the same cascade as
    /// single-item deletion.
    pub fn clear_category(&mut self, category: Category, confirmed: bool) -> Result<ClearOutcome> {
        if self.state.catalog.items(category).is_empty()
            && !self.state.price_meta.contains_key(&category)
        {
            return Ok(ClearOutcome::AlreadyEmpty);
        }
        if !confirmed {
            return Err(AppError::ConfirmationRequired(
                "clearing a price list also removes its demand lines".into(),
            ));
        }
        let removed = self.state.catalog.clear_category(category);
        self.state.price_meta.remove(&category);
        let removed_ids: HashSet<&str> = removed.iter().map(|item| item.id.as_str()).collect();

        let before = self.state.demand.len();
        self.state
            .demand
            .retain(|line| !removed_ids.contains(line.product_id.as_str()));
        let demand_removed = before - self.state.demand.len();

        let mut requests_touched = 0;
        for doc in &mut self.state.requests {
            let before = doc.extracted_products.len();
            doc.extracted_products
                .retain(|p| !removed_ids.contains(p.product_id.as_str()));
            if doc.extracted_products.len() != before {
                requests_touched += 1;
            }
        }

        self.persist()?;
        Ok(ClearOutcome::Cleared {
            items: removed.len(),
            demand_removed,
            requests_touched,
        })
    }

    /// Reset everything back to a fresh state.
    pub fn clear_all(&mut self, confirmed: bool) -> Result<()> {
        if !confirmed {
            return Err(AppError::ConfirmationRequired(
                "this wipes the catalog, requests and demand list".into(),
            ));
        }
        self.state = AppState::default();
        self.persist()
    }

    pub fn set_discount(&mut self, category: Category, value: f64) -> Result<()> {
        self.state.settings.set_discount(category, value);
        self.persist()
    }

    pub fn set_vat_rate(&mut self, value: f64) -> Result<()> {
        self.state.settings.set_vat_rate(value);
        self.persist()
    }

    pub fn set_notes(&mut self, notes: String) -> Result<()> {
        self.state.settings.notes = notes;
        self.persist()
    }

    /// Price the current demand list. Read-only, recomputed every call.
    pub fn compute_offer(&self) -> Offer {
        offer::compute_offer(&self.state.demand, &self.state.settings)
    }

    /// Write the priced offer out as a delimited file. Returns the number
    /// of product rows written.
    pub fn export_offer<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        if self.state.demand.is_empty() {
            return Err(AppError::Validation(
                "the demand list is empty, nothing to export".into(),
            ));
        }
        let offer = self.compute_offer();
        tabular::write_offer(path, &offer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogItem;
    use crate::extract::{NOTE_NO_PRICE_LIST, NOTE_OCR_UNAVAILABLE};
    use crate::ocr::NoOcr;
    use crate::record::Record;

    fn test_app() -> App {
        let store = SnapshotStore::open_in_memory().unwrap();
        App::open(store, &Config::default()).unwrap()
    }

    fn test_item(id: &str, name: &str, price: f64) -> CatalogItem {
        CatalogItem {
            id: id.into(),
            category: Category::Plastic,
            name: name.into(),
            description: None,
            code: None,
            unit: "Adet".into(),
            unit_price: price,
            aliases: vec![name.to_string()],
            source: Record::new(),
        }
    }

    fn text_file(name: &str, content: &str) -> IncomingFile {
        IncomingFile {
            name: name.into(),
            mime_type: "text/plain".into(),
            bytes: content.as_bytes().to_vec(),
        }
    }

    #[test]
    fn price_list_upload_replaces_catalog_and_records_meta() {
        let mut app = test_app();
        let csv = "Ürün,Fiyat\nPlastik Boru 20mm,12.50\nPlastik Dirsek,4.75\n";
        let count = app
            .upload_price_list(Category::Plastic, "liste.csv", csv.as_bytes())
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(app.state().catalog.items(Category::Plastic).len(), 2);
        assert_eq!(
            app.state().price_meta[&Category::Plastic].file_name,
            "liste.csv"
        );

        // a second upload replaces, never appends
        let csv = "Ürün,Fiyat\nPlastik Vana,9.90\n";
        app.upload_price_list(Category::Plastic, "liste2.csv", csv.as_bytes())
            .unwrap();
        let items = app.state().catalog.items(Category::Plastic);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Plastik Vana");
    }

    #[test]
    fn price_list_without_prices_is_rejected() {
        let mut app = test_app();
        let csv = "Ürün,Not\nPlastik Boru,belirsiz\n";
        let err = app
            .upload_price_list(Category::Plastic, "liste.csv", csv.as_bytes())
            .unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
        assert!(app.state().catalog.is_empty());
    }

    #[tokio::test]
    async fn ingest_extracts_and_fills_the_demand_list() {
        let mut app = test_app();
        app.state
            .catalog
            .replace(Category::Plastic, vec![test_item("p1", "Plastik Boru", 10.0)]);

        let report = app
            .ingest_request_files(
                vec![text_file("talep.txt", "plastik boru 3 adet\n")],
                &NoOcr,
            )
            .await
            .unwrap();
        assert_eq!(report.documents, 1);
        assert_eq!(report.auto_added, 1);
        assert_eq!(report.message(), "1 belge kaydedildi. 1 ürün otomatik eklendi.");

        assert_eq!(app.state().demand.len(), 1);
        assert_eq!(app.state().demand[0].quantity, 3);
        assert_eq!(app.state().demand[0].product_id, "p1");

        let doc = &app.state().requests[0];
        assert_eq!(doc.extracted_products.len(), 1);
        assert_eq!(app.state().demand[0].request_id.as_deref(), Some(doc.id.as_str()));
        assert_eq!(
            doc.extraction_note,
            "1 ürün otomatik olarak talep listesine eklendi."
        );
        assert!(doc.preview_payload.is_some());
    }

    #[tokio::test]
    async fn ingest_without_a_price_list_records_the_document_anyway() {
        let mut app = test_app();
        let report = app
            .ingest_request_files(vec![text_file("talep.txt", "plastik boru")], &NoOcr)
            .await
            .unwrap();
        assert_eq!(report.documents, 1);
        assert_eq!(report.auto_added, 0);
        let doc = &app.state().requests[0];
        assert_eq!(doc.extraction_note, NOTE_NO_PRICE_LIST);
        assert!(doc.extracted_products.is_empty());
        assert!(app.state().demand.is_empty());
    }

    #[tokio::test]
    async fn ingest_notes_an_image_when_no_recognizer_is_wired() {
        let mut app = test_app();
        app.state
            .catalog
            .replace(Category::Plastic, vec![test_item("p1", "Plastik Boru", 10.0)]);
        app.ingest_request_files(
            vec![IncomingFile {
                name: "foto.png".into(),
                mime_type: "image/png".into(),
                bytes: vec![0x89, 0x50, 0x4e, 0x47],
            }],
            &NoOcr,
        )
        .await
        .unwrap();
        assert_eq!(app.state().requests[0].extraction_note, NOTE_OCR_UNAVAILABLE);
    }

    #[tokio::test]
    async fn oversized_uploads_drop_the_preview_payload() {
        let mut app = test_app();
        let big = IncomingFile {
            name: "büyük.txt".into(),
            mime_type: "text/plain".into(),
            bytes: vec![b' '; PREVIEW_CEILING as usize + 1],
        };
        app.ingest_request_files(vec![big], &NoOcr).await.unwrap();
        let doc = &app.state().requests[0];
        assert!(doc.preview_payload.is_none());
        assert_eq!(doc.size, PREVIEW_CEILING + 1);
    }

    #[test]
    fn manual_adds_always_append() {
        let mut app = test_app();
        app.state
            .catalog
            .replace(Category::Plastic, vec![test_item("p1", "Plastik Boru", 10.0)]);
        app.add_demand_line(Category::Plastic, "p1", 2.0).unwrap();
        app.add_demand_line(Category::Plastic, "p1", 5.0).unwrap();
        assert_eq!(app.state().demand.len(), 2);
        assert!(app.state().demand.iter().all(|l| l.request_id.is_none()));

        let err = app
            .add_demand_line(Category::Metal, "p1", 1.0)
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // a bad manual quantity is rejected, not coerced
        let err = app
            .add_demand_line(Category::Plastic, "p1", 0.0)
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn quantity_edits_and_removal() {
        let mut app = test_app();
        app.state
            .catalog
            .replace(Category::Plastic, vec![test_item("p1", "Plastik Boru", 10.0)]);
        let line = app.add_demand_line(Category::Plastic, "p1", 2.0).unwrap();

        assert_eq!(app.set_demand_quantity(&line.id, 7.0).unwrap(), 7);
        // garbage quantity resets to 1 rather than erroring
        assert_eq!(app.set_demand_quantity(&line.id, -3.0).unwrap(), 1);

        app.remove_demand_line(&line.id).unwrap();
        assert!(app.state().demand.is_empty());
        assert!(matches!(
            app.remove_demand_line(&line.id),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn edit_item_cascades_to_demand_and_request_snapshots() {
        let mut app = test_app();
        app.state
            .catalog
            .replace(Category::Plastic, vec![test_item("p1", "Plastik Boru", 10.0)]);
        app.add_demand_line(Category::Plastic, "p1", 1.0).unwrap();
        app.state.requests.push(RequestDocument {
            id: "r1".into(),
            name: "talep.txt".into(),
            size: 10,
            mime_type: "text/plain".into(),
            uploaded_at: now_rfc3339(),
            preview_payload: None,
            extracted_products: vec![ExtractedProduct {
                product_id: "p1".into(),
                product_name: "Plastik Boru".into(),
                product_code: None,
                category: Category::Plastic,
                quantity: 1,
            }],
            extraction_note: String::new(),
        });

        app.edit_item(
            "p1",
            ItemEdit {
                name: "Plastik Boru 25mm".into(),
                description: None,
                code: Some("PL-25".into()),
                unit: "Adet".into(),
                unit_price: 14.0,
            },
        )
        .unwrap();

        let item = app.state().catalog.get("p1").unwrap();
        assert_eq!(item.name, "Plastik Boru 25mm");
        assert_eq!(item.unit_price, 14.0);
        // the old name survives as an alias so prior match keys keep working
        assert!(item.aliases.iter().any(|a| a == "Plastik Boru"));

        assert_eq!(app.state().demand[0].product_name, "Plastik Boru 25mm");
        assert_eq!(app.state().demand[0].unit_price, 14.0);
        assert_eq!(app.state().demand[0].product_code.as_deref(), Some("PL-25"));
        assert_eq!(
            app.state().requests[0].extracted_products[0].product_name,
            "Plastik Boru 25mm"
        );
    }

    #[test]
    fn edit_item_validates_its_inputs() {
        let mut app = test_app();
        app.state
            .catalog
            .replace(Category::Plastic, vec![test_item("p1", "Plastik Boru", 10.0)]);
        let edit = |name: &str, price: f64| ItemEdit {
            name: name.into(),
            description: None,
            code: None,
            unit: "Adet".into(),
            unit_price: price,
        };
        assert!(matches!(
            app.edit_item("p1", edit("  ", 10.0)),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            app.edit_item("p1", edit("Boru", -1.0)),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            app.edit_item("yok", edit("Boru", 10.0)),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn delete_item_cascades_and_requires_confirmation() {
        let mut app = test_app();
        app.state.catalog.replace(
            Category::Plastic,
            vec![
                test_item("p1", "Plastik Boru", 10.0),
                test_item("p2", "Plastik Dirsek", 4.0),
            ],
        );
        app.add_demand_line(Category::Plastic, "p1", 2.0).unwrap();
        app.add_demand_line(Category::Plastic, "p2", 1.0).unwrap();
        app.state.requests.push(RequestDocument {
            id: "r1".into(),
            name: "talep.txt".into(),
            size: 10,
            mime_type: "text/plain".into(),
            uploaded_at: now_rfc3339(),
            preview_payload: None,
            extracted_products: vec![ExtractedProduct {
                product_id: "p1".into(),
                product_name: "Plastik Boru".into(),
                product_code: None,
                category: Category::Plastic,
                quantity: 2,
            }],
            extraction_note: String::new(),
        });

        assert!(matches!(
            app.delete_item("p1", false),
            Err(AppError::ConfirmationRequired(_))
        ));
        assert_eq!(app.state().demand.len(), 2);

        let outcome = app.delete_item("p1", true).unwrap();
        assert_eq!(outcome.name, "Plastik Boru");
        assert_eq!(outcome.demand_removed, 1);
        assert_eq!(outcome.requests_touched, 1);
        assert!(app.state().catalog.get("p1").is_none());
        assert_eq!(app.state().demand.len(), 1);
        assert_eq!(app.state().demand[0].product_id, "p2");
        assert!(app.state().requests[0].extracted_products.is_empty());
        // the document itself stays
        assert_eq!(app.state().requests.len(), 1);
    }

    #[test]
    fn clear_category_cascades_and_clears_meta() {
        let mut app = test_app();
        assert!(matches!(
            app.clear_category(Category::Metal, false),
            Ok(ClearOutcome::AlreadyEmpty)
        ));

        app.state
            .catalog
            .replace(Category::Plastic, vec![test_item("p1", "Plastik Boru", 10.0)]);
        app.state.price_meta.insert(
            Category::Plastic,
            PriceMeta {
                file_name: "liste.csv".into(),
                uploaded_at: now_rfc3339(),
            },
        );
        app.add_demand_line(Category::Plastic, "p1", 2.0).unwrap();

        assert!(matches!(
            app.clear_category(Category::Plastic, false),
            Err(AppError::ConfirmationRequired(_))
        ));

        let outcome = app.clear_category(Category::Plastic, true).unwrap();
        match outcome {
            ClearOutcome::Cleared {
                items,
                demand_removed,
                ..
            } => {
                assert_eq!(items, 1);
                assert_eq!(demand_removed, 1);
            }
            ClearOutcome::AlreadyEmpty => panic!("expected a cleared outcome"),
        }
        assert!(app.state().catalog.items(Category::Plastic).is_empty());
        assert!(!app.state().price_meta.contains_key(&Category::Plastic));
        assert!(app.state().demand.is_empty());
    }

    #[test]
    fn clear_all_resets_to_defaults() {
        let mut app = test_app();
        app.state
            .catalog
            .replace(Category::Plastic, vec![test_item("p1", "Plastik Boru", 10.0)]);
        app.set_vat_rate(10.0).unwrap();

        assert!(matches!(
            app.clear_all(false),
            Err(AppError::ConfirmationRequired(_))
        ));
        app.clear_all(true).unwrap();
        assert!(app.state().catalog.is_empty());
        assert_eq!(app.state().settings.vat_rate, 20.0);
    }

    #[test]
    fn export_refuses_an_empty_demand_list() {
        let app = test_app();
        assert!(matches!(
            app.export_offer("teklif.csv"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn offer_reflects_settings_changes_immediately() {
        let mut app = test_app();
        app.state
            .catalog
            .replace(Category::Plastic, vec![test_item("p1", "Plastik Boru", 100.0)]);
        app.add_demand_line(Category::Plastic, "p1", 3.0).unwrap();
        app.set_discount(Category::Plastic, 10.0).unwrap();
        app.set_vat_rate(20.0).unwrap();

        let offer = app.compute_offer();
        assert!((offer.totals.grand_total - 324.0).abs() < 1e-9);

        app.set_discount(Category::Plastic, 0.0).unwrap();
        let offer = app.compute_offer();
        assert!((offer.totals.grand_total - 360.0).abs() < 1e-9);
    }

    #[test]
    fn fresh_state_takes_the_configured_vat_rate() {
        let store = SnapshotStore::open_in_memory().unwrap();
        let config = Config {
            default_vat_rate: Some(10.0),
            ..Config::default()
        };
        let app = App::open(store, &config).unwrap();
        assert_eq!(app.state().settings.vat_rate, 10.0);
    }
}
