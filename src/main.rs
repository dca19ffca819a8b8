fn main() {
    shootlapse_lib::run()
}
