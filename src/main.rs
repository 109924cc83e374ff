#[tokio::main]
async fn main() {
    if let Err(e) = urinevision_lib::run().await {
        eprintln!("urinevision: {e}");
        std::process::exit(1);
    }
}
