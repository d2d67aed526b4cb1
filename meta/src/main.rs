fn main() {
    multiversx_sc_meta_lib::cli_main::<emissions_controller::AbiProvider>();
}
