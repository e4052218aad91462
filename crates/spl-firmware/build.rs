use std::env;

const FORWARDED_VARS: [&str; 3] = ["SPL_WIFI_SSID", "SPL_WIFI_PASSWORD", "SPL_API_KEY"];

fn main() {
    // Credentials come from a local .env (or the real environment in CI)
    // so they never land in the repository. Unset variables are forwarded
    // as empty strings; the firmware warns about those at boot.
    let _ = dotenvy::dotenv();

    for var in FORWARDED_VARS {
        let value = env::var(var).unwrap_or_default();
        println!("cargo:rustc-env={}={}", var, value);
        println!("cargo:rerun-if-env-changed={}", var);
    }
    println!("cargo:rerun-if-changed=.env");
}
