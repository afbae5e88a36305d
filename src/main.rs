fn main() {
    lootimer_lib::run()
}
