fn main() {
    // ESP-IDF environment propagation is only needed for the firmware build;
    // host-side tests compile without the espidf feature.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
