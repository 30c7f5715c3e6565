fn main() {
    if let Err(err) = xlfixture::snapshot::run(std::env::args_os()) {
        eprintln!("failed to dump workbook: {err:#}");
        std::process::exit(1);
    }
}
