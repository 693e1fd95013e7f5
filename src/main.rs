fn main() -> std::process::ExitCode {
    intpatient_lib::run()
}
