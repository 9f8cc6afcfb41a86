fn main() {
    killchain_lib::run()
}
