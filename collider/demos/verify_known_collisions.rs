use md5_collider::collision::differs_by;
use md5_collider::{
    md5_to_hex, print_box, verify_block0, verify_block1, ChainingValue, PathVariant,
    WangCollisionExample, BLOCK0_OUTPUT_DELTA, WANG_COLLISION_0, WANG_COLLISION_1,
};

fn show_differences(name0: &str, arr0: &[u32; 16], name1: &str, arr1: &[u32; 16]) {
    println!("Comparing {} vs {}:", name0, name1);
    for i in 0..16 {
        if arr0[i] != arr1[i] {
            println!("  Word[{}]: 0x{:08x} vs 0x{:08x} (additive diff: 0x{:08x})",
                     i, arr0[i], arr1[i], arr1[i].wrapping_sub(arr0[i]));
        }
    }
}

fn verify_collision_example(name: &str, collision: &WangCollisionExample) {
    println!("\n{}", name);
    println!("{}", "═".repeat(65));

    show_differences("M0", &collision.m0, "M'0", &collision.m0_prime);
    println!();
    show_differences("M1", &collision.m1, "M'1", &collision.m1_prime);

    let iv0 = collision.intermediate_state_0();
    let iv0_prime = collision.intermediate_state_0_prime();

    println!("\nIntermediate states after M0:");
    println!("  IV0  = {:08x?}", iv0.words());
    println!("  IV'0 = {:08x?}", iv0_prime.words());
    println!("  IV'0 - IV0 = {:08x?}", iv0_prime.wrapping_difference(iv0));
    println!("  Second-block path: {}", PathVariant::select(iv0));

    let near = differs_by(ChainingValue::STANDARD, &collision.m0,
                          ChainingValue::STANDARD, &collision.m0_prime, BLOCK0_OUTPUT_DELTA);
    println!("\n{} Block 0 near-collision", if near && verify_block0(ChainingValue::STANDARD, &collision.m0) { "✓" } else { "✗" });
    println!("{} Block 1 cancels the difference", if verify_block1(iv0, &collision.m1) { "✓" } else { "✗" });

    let pair = collision.as_pair();
    let (h1, h2) = pair.md5_digests();
    println!("\nMD5(M0 || M1)   = {}", md5_to_hex(&h1));
    println!("MD5(M'0 || M'1) = {}", md5_to_hex(&h2));

    let is_collision = collision.verify();
    println!("\n{} Collision: {}",
             if is_collision { "✓" } else { "✗" },
             if is_collision { "VERIFIED" } else { "FAILED" });
}

fn main() {
    print_box("Wang MD5 Collision Verification");

    verify_collision_example("WANG_COLLISION_0", &WANG_COLLISION_0);
    verify_collision_example("\nWANG_COLLISION_1", &WANG_COLLISION_1);
}
