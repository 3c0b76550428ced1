fn main() {
    deca::platform::browser::start();
}
