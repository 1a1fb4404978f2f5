use leptos::mount::mount_to_body;

pub fn main() {
    tracing_wasm::set_as_global_default();
    console_error_panic_hook::set_once();

    mount_to_body(admin_panel::app::App);
}
