mod app;
mod catalog;
mod classify;
mod config;
mod demand;
mod errors;
mod extract;
mod normalize;
mod ocr;
mod offer;
mod pdf_text;
mod record;
mod state;
mod store;
mod tabular;

use app::{App, ClearOutcome, IncomingFile, ItemEdit};
use catalog::Category;
use errors::AppError;
use ocr::NoOcr;
use std::fs;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // init tracing
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter("info")
        .init();

    let cfg = config::Config::load_or_default(".config/teklif.toml");
    let store = store::SnapshotStore::open(&cfg.db_path)?;
    let mut app = App::open(store, &cfg)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let confirmed = args.iter().any(|a| a == "--yes");
    let args: Vec<&str> = args.iter().map(String::as_str).filter(|a| *a != "--yes").collect();

    match args.as_slice() {
        ["prices", category, path] => {
            let category = parse_category(category)?;
            let bytes = fs::read(path)?;
            let count = app.upload_price_list(category, path, &bytes)?;
            info!(category = %category, items = count, "price list uploaded");
        }
        ["ingest", paths @ ..] if !paths.is_empty() => {
            let mut files = Vec::with_capacity(paths.len());
            for path in paths {
                files.push(IncomingFile {
                    name: path.to_string(),
                    mime_type: guess_mime(path).to_string(),
                    bytes: fs::read(path)?,
                });
            }
            let report = app.ingest_request_files(files, &NoOcr).await?;
            println!("{}", report.message());
        }
        ["add", category, product_id, quantity] => {
            let category = parse_category(category)?;
            let line = app.add_demand_line(category, product_id, quantity.parse()?)?;
            println!("{} x{} eklendi ({})", line.product_name, line.quantity, line.id);
        }
        ["quantity", line_id, quantity] => {
            let quantity = app.set_demand_quantity(line_id, quantity.parse()?)?;
            println!("yeni adet: {quantity}");
        }
        ["remove", line_id] => {
            let removed = app.remove_demand_line(line_id)?;
            println!("{} listeden çıkarıldı", removed.product_name);
        }
        ["edit-item", id, name, unit_price] => {
            let current = app
                .state()
                .catalog
                .get(id)
                .ok_or_else(|| AppError::NotFound(format!("no catalog item {id}")))?;
            let edit = ItemEdit {
                name: name.to_string(),
                description: current.description.clone(),
                code: current.code.clone(),
                unit: current.unit.clone(),
                unit_price: unit_price.parse()?,
            };
            app.edit_item(id, edit)?;
            println!("ürün güncellendi");
        }
        ["delete-item", id] => {
            let outcome = app.delete_item(id, confirmed)?;
            println!(
                "{} silindi ({} talep satırı, {} belge kaydı etkilendi)",
                outcome.name, outcome.demand_removed, outcome.requests_touched
            );
        }
        ["clear-category", category] => {
            let category = parse_category(category)?;
            match app.clear_category(category, confirmed)? {
                ClearOutcome::AlreadyEmpty => println!("{} listesi zaten boş", category.label()),
                ClearOutcome::Cleared {
                    items,
                    demand_removed,
                    ..
                } => println!(
                    "{} listesi temizlendi ({items} ürün, {demand_removed} talep satırı)",
                    category.label()
                ),
            }
        }
        ["clear-all"] => {
            app.clear_all(confirmed)?;
            println!("tüm veriler sıfırlandı");
        }
        ["discount", category, rate] => {
            let category = parse_category(category)?;
            app.set_discount(category, rate.parse()?)?;
        }
        ["vat", rate] => {
            app.set_vat_rate(rate.parse()?)?;
        }
        ["notes", rest @ ..] => {
            app.set_notes(rest.join(" "))?;
        }
        ["show"] => show(&app),
        ["export", path] => {
            let rows = app.export_offer(path)?;
            println!("{rows} satır {path} dosyasına yazıldı");
        }
        _ => usage(),
    }

    Ok(())
}

fn parse_category(text: &str) -> Result<Category, AppError> {
    Category::parse(text)
        .ok_or_else(|| AppError::Validation(format!("unknown category: {text}")))
}

/// MIME guess from the file extension, for files coming off the local
/// disk rather than an upload form.
fn guess_mime(path: &str) -> &'static str {
    match tabular::file_extension(path).as_str() {
        "xlsx" | "xlsm" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xls" => "application/vnd.ms-excel",
        "csv" => "text/csv",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

fn show(app: &App) {
    let state = app.state();
    for category in Category::ALL {
        let items = state.catalog.items(category);
        match state.price_meta.get(&category) {
            Some(meta) => println!(
                "{}: {} ürün ({}, {})",
                category.label(),
                items.len(),
                meta.file_name,
                meta.uploaded_at
            ),
            None => println!("{}: fiyat listesi yok", category.label()),
        }
    }

    println!("\nBelgeler:");
    for doc in &state.requests {
        println!(
            "  {} {} — {}",
            doc.id, doc.name, doc.extraction_note
        );
    }

    println!("\nTalep listesi:");
    let offer = app.compute_offer();
    for (line, row) in state.demand.iter().zip(&offer.rows) {
        println!(
            "  {} {} x{} @ {:.2} → {:.2}",
            line.id, line.product_name, line.quantity, line.unit_price, row.line_total
        );
    }
    println!(
        "Ara toplam {:.2}  KDV {:.2}  Genel toplam {:.2}",
        offer.totals.subtotal, offer.totals.vat_total, offer.totals.grand_total
    );
}

fn usage() {
    eprintln!(
        "kullanım:
  teklif prices <kategori> <dosya>        fiyat listesi yükle
  teklif ingest <dosya...>                talep belgelerini işle
  teklif add <kategori> <ürün-id> <adet>  elle talep satırı ekle
  teklif quantity <satır-id> <adet>       talep adedini değiştir
  teklif remove <satır-id>                talep satırını sil
  teklif edit-item <id> <ad> <fiyat>      katalog ürününü düzenle
  teklif delete-item <id> [--yes]         katalog ürününü sil
  teklif clear-category <kategori> [--yes]
  teklif clear-all [--yes]
  teklif discount <kategori> <oran>       iskonto oranı (%)
  teklif vat <oran>                       KDV oranı (%)
  teklif notes <metin...>                 teklif notları
  teklif show                             durumu göster
  teklif export <dosya.csv>               fiyatlı teklifi dışa aktar"
    );
}
