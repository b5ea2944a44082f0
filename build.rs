use chrono::Utc;

fn main() {
    // SOURCE_DATE_EPOCH があれば再現可能ビルドとして優先
    let build_time = std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", build_time);
}
