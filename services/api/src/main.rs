use estate_desk_api::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("estate-desk: {err}");
        std::process::exit(1);
    }
}
